use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Installment, InstallmentStatus, StudentFeeLedger};

/// Status change for one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub installment_id: String,
    pub status: InstallmentStatus,
    /// Only meaningful with `paid`
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

/// Field changes for an existing installment; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentChange {
    pub installment_id: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<InstallmentStatus>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
}

/// Installment added by hand to a student's schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInstallment {
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: Option<InstallmentStatus>,
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub repayment_period_days: u32,
}

/// Administrator bulk edit of one student's schedule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEdit {
    #[serde(default)]
    pub changes: Vec<InstallmentChange>,
    #[serde(default)]
    pub additions: Vec<NewInstallment>,
    #[serde(default)]
    pub removals: Vec<String>,
}

impl ScheduleEdit {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.additions.is_empty() && self.removals.is_empty()
    }
}

/// Every schedule mutation the repositories execute under the ledger lock
///
/// Plans are resolved against the installments read inside the transaction,
/// so a plan such as "mark the first N paid" sees the locked state.
#[derive(Debug, Clone, PartialEq)]
pub enum EditPlan {
    /// Status transitions for a batch of installments
    Statuses(Vec<StatusUpdate>),
    /// Free-form administrator edit
    Edit(ScheduleEdit),
    /// First `n` installments by sequence paid, later paid ones back to pending
    SettlePaidCount(u32),
    /// Pending installments due before today become overdue
    MarkOverdue,
    /// No installment change, only the balance recompute
    Recompute,
}

/// Student ledger together with its ordered installments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleState {
    pub ledger: StudentFeeLedger,
    pub installments: Vec<Installment>,
}

/// Result of materializing a schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "installments", rename_all = "snake_case")]
pub enum MaterializeOutcome {
    /// Installments were created by this call
    Materialized(Vec<Installment>),
    /// The ledger already had a schedule; nothing was written
    AlreadyScheduled(Vec<Installment>),
}

impl MaterializeOutcome {
    pub fn installments(&self) -> &[Installment] {
        match self {
            Self::Materialized(list) | Self::AlreadyScheduled(list) => list,
        }
    }

    pub fn into_installments(self) -> Vec<Installment> {
        match self {
            Self::Materialized(list) | Self::AlreadyScheduled(list) => list,
        }
    }

    pub fn was_materialized(&self) -> bool {
        matches!(self, Self::Materialized(_))
    }
}
