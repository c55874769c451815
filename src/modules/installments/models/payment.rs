use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Installment;

/// Reporting record kept alongside a paid installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub installment_id: String,
    pub payment_date: NaiveDate,
    pub amount: Decimal,
    pub created_at: NaiveDateTime,
}

impl Payment {
    /// Payment record for `installment`, or `None` when it is not paid
    pub fn for_installment(installment: &Installment, now: NaiveDateTime) -> Option<Self> {
        let payment_date = installment.payment_date.filter(|_| installment.is_paid())?;

        Some(Self {
            id: Uuid::new_v4().to_string(),
            installment_id: installment.id.clone(),
            payment_date,
            amount: installment.amount,
            created_at: now,
        })
    }
}
