use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{Installment, InstallmentStatus, StudentFeeLedger};

/// Read model of a student's fee position
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeSummary {
    pub student_fee_id: String,
    pub installment_count: usize,
    pub paid_count: usize,
    pub pending_count: usize,
    pub overdue_count: usize,
    pub total_scheduled: Decimal,
    pub total_paid: Decimal,
    /// Sum of pending and overdue amounts
    pub total_outstanding: Decimal,
    pub remaining_amount: Decimal,
    pub next_due: Option<NextDue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextDue {
    pub installment_id: String,
    pub sequence: u32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
}

impl FeeSummary {
    pub fn from_schedule(ledger: &StudentFeeLedger, installments: &[Installment]) -> Self {
        let count = |status: InstallmentStatus| {
            installments.iter().filter(|i| i.status == status).count()
        };
        let total = |paid: bool| -> Decimal {
            installments
                .iter()
                .filter(|i| i.is_paid() == paid)
                .map(|i| i.amount)
                .sum()
        };

        let next_due = installments
            .iter()
            .filter(|i| !i.is_paid())
            .min_by_key(|i| (i.due_date, i.sequence))
            .map(|i| NextDue {
                installment_id: i.id.clone(),
                sequence: i.sequence,
                due_date: i.due_date,
                amount: i.amount,
            });

        Self {
            student_fee_id: ledger.id.clone(),
            installment_count: installments.len(),
            paid_count: count(InstallmentStatus::Paid),
            pending_count: count(InstallmentStatus::Pending),
            overdue_count: count(InstallmentStatus::Overdue),
            total_scheduled: installments.iter().map(|i| i.amount).sum(),
            total_paid: total(true),
            total_outstanding: total(false),
            remaining_amount: ledger.remaining_amount,
            next_due,
        }
    }
}
