use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{money, Result};

/// Fee configuration for one batch
///
/// `remaining_amount` is always `total_fee - discount`. It is recomputed by
/// every call to [`BatchFeeLedger::set_fees`] and never assigned on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFeeLedger {
    pub id: String,
    pub batch_id: String,
    pub total_fee: Decimal,
    pub discount: Decimal,
    pub remaining_amount: Decimal,
    /// Suggested amount per installment, informational only
    pub installment_amount: Decimal,
    /// Default repayment period in days, informational only
    pub repayment_period_days: u32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl BatchFeeLedger {
    /// Ledger with zero defaults, created alongside a new batch
    pub fn new(batch_id: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            batch_id: batch_id.into(),
            total_fee: Decimal::ZERO,
            discount: Decimal::ZERO,
            remaining_amount: Decimal::ZERO,
            installment_amount: Decimal::ZERO,
            repayment_period_days: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Amount still owed for the batch before any student payment
    ///
    /// A discount larger than the fee gives a negative result. It is not
    /// clamped.
    pub fn derive_remaining(total_fee: Decimal, discount: Decimal) -> Decimal {
        total_fee - discount
    }

    /// Sets the total fee and discount, returning the new remaining amount
    pub fn set_fees(
        &mut self,
        total_fee: Decimal,
        discount: Decimal,
        now: NaiveDateTime,
    ) -> Result<Decimal> {
        money::validate_amount("total_fee", total_fee)?;
        money::validate_amount("discount", discount)?;

        self.total_fee = total_fee;
        self.discount = discount;
        self.remaining_amount = Self::derive_remaining(total_fee, discount);
        self.updated_at = now;

        if self.remaining_amount < Decimal::ZERO {
            tracing::warn!(
                batch_id = self.batch_id.as_str(),
                total_fee = %total_fee,
                discount = %discount,
                "Discount exceeds total fee, remaining amount is negative"
            );
        }

        Ok(self.remaining_amount)
    }

    /// Updates the informational installment amount and default period
    pub fn set_installment_defaults(
        &mut self,
        installment_amount: Decimal,
        repayment_period_days: u32,
        now: NaiveDateTime,
    ) -> Result<()> {
        money::validate_amount("installment_amount", installment_amount)?;

        self.installment_amount = installment_amount;
        self.repayment_period_days = repayment_period_days;
        self.updated_at = now;

        Ok(())
    }
}
