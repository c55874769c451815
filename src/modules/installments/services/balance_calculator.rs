use rust_decimal::Decimal;

use crate::modules::installments::models::Installment;

/// Balance arithmetic for student ledgers
///
/// One recompute policy applies everywhere: the batch ledger's current
/// remaining amount minus the amounts of paid installments.
pub struct BalanceCalculator;

impl BalanceCalculator {
    pub fn total_paid(installments: &[Installment]) -> Decimal {
        installments
            .iter()
            .filter(|i| i.is_paid())
            .map(|i| i.amount)
            .sum()
    }

    /// Pending plus overdue
    pub fn total_outstanding(installments: &[Installment]) -> Decimal {
        installments
            .iter()
            .filter(|i| !i.is_paid())
            .map(|i| i.amount)
            .sum()
    }

    /// Student remaining amount re-anchored on the batch's current remaining amount
    pub fn recompute_remaining(batch_remaining: Decimal, installments: &[Installment]) -> Decimal {
        batch_remaining - Self::total_paid(installments)
    }
}
