use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::fees::models::BatchFeeLedger;

/// Fee balance of one student in one batch
///
/// `remaining_amount` starts as a snapshot of the batch ledger's remaining
/// amount and is decoupled from later batch edits until the next recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFeeLedger {
    pub id: String,
    pub batch_fee_id: String,
    pub batch_id: String,
    pub user_id: i64,
    pub remaining_amount: Decimal,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl StudentFeeLedger {
    /// Opens a ledger for `user_id`, snapshotting the batch remaining amount
    pub fn open(batch_ledger: &BatchFeeLedger, user_id: i64, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            batch_fee_id: batch_ledger.id.clone(),
            batch_id: batch_ledger.batch_id.clone(),
            user_id,
            remaining_amount: batch_ledger.remaining_amount,
            created_at: now,
            updated_at: now,
        }
    }
}
