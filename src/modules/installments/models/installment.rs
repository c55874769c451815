use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

/// A dated installment owed by one student
///
/// Invariant: `payment_date` is `Some` exactly when `status` is `Paid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: String,
    pub student_fee_id: String,
    /// 1-based position in the student's schedule
    pub sequence: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: InstallmentStatus,
    pub payment_date: Option<NaiveDate>,
    /// Copied from the originating template, informational
    pub repayment_period_days: u32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// Not yet paid
    Pending,
    /// Payment received
    Paid,
    /// Due date passed without payment
    Overdue,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InstallmentStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            _ => Err(AppError::validation(format!(
                "Invalid installment status: {}",
                value
            ))),
        }
    }
}

impl TryFrom<String> for InstallmentStatus {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Installment {
    /// New pending installment
    pub fn pending(
        student_fee_id: impl Into<String>,
        sequence: u32,
        due_date: NaiveDate,
        amount: Decimal,
        repayment_period_days: u32,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student_fee_id: student_fee_id.into(),
            sequence,
            due_date,
            amount,
            status: InstallmentStatus::Pending,
            payment_date: None,
            repayment_period_days,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the installment to `status`
    ///
    /// Any state may move to any state. Becoming paid stamps `payment_date`
    /// with `explicit_date`, or `today`, only when no date was recorded yet.
    /// An already recorded date is kept. Leaving paid always clears it.
    pub fn transition(
        &mut self,
        status: InstallmentStatus,
        explicit_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<()> {
        match status {
            InstallmentStatus::Paid => {
                if self.payment_date.is_none() {
                    self.payment_date = Some(explicit_date.unwrap_or(today));
                }
            }
            InstallmentStatus::Pending | InstallmentStatus::Overdue => {
                if explicit_date.is_some() {
                    return Err(AppError::validation(format!(
                        "Installment {}: a payment date is only accepted with status paid",
                        self.sequence
                    )));
                }
                self.payment_date = None;
            }
        }

        self.status = status;
        Ok(())
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// Unpaid and due before `today`
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        !self.is_paid() && self.due_date < today
    }
}
