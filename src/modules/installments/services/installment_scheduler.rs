use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::core::{AppError, Result};
use crate::modules::fees::models::InstallmentTemplate;
use crate::modules::installments::models::{Installment, StudentFeeLedger};

/// Derives a student's dated installments from the batch plan
pub struct InstallmentScheduler;

impl InstallmentScheduler {
    /// Builds the schedule for `ledger` anchored at `anchor_date`
    ///
    /// Templates are taken in position order. Each template's period is added
    /// to a running day count and the installment falls due that many days
    /// after the anchor, so periods compound: periods of 30, 30 and 30 days
    /// give due dates at +30, +60 and +90 days.
    ///
    /// No templates gives an empty schedule.
    pub fn build_schedule(
        ledger: &StudentFeeLedger,
        templates: &[InstallmentTemplate],
        anchor_date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<Installment>> {
        let mut ordered: Vec<&InstallmentTemplate> = templates.iter().collect();
        ordered.sort_by_key(|t| t.position);

        let mut cumulative_days: u64 = 0;
        let mut schedule = Vec::with_capacity(ordered.len());

        for (index, template) in ordered.into_iter().enumerate() {
            cumulative_days += u64::from(template.repayment_period_days);

            let due_date = anchor_date
                .checked_add_days(Days::new(cumulative_days))
                .ok_or_else(|| {
                    AppError::validation(format!(
                        "Installment {} falls outside the supported date range",
                        index + 1
                    ))
                })?;

            schedule.push(Installment::pending(
                ledger.id.clone(),
                index as u32 + 1,
                due_date,
                template.amount,
                template.repayment_period_days,
                now,
            ));
        }

        debug!(
            student_fee_id = ledger.id.as_str(),
            anchor_date = %anchor_date,
            installments = schedule.len(),
            "Built installment schedule"
        );

        Ok(schedule)
    }
}
