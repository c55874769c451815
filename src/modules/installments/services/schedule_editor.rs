// ScheduleEditor: resolves an EditPlan against a locked schedule
//
// Repositories call this inside their transaction after locking the student
// ledger, then persist the returned diff and remaining amount together.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::core::{money, AppError, Result};
use crate::modules::installments::models::{
    EditPlan, Installment, InstallmentChange, InstallmentStatus, ScheduleEdit, StudentFeeLedger,
};
use crate::modules::installments::services::BalanceCalculator;

/// Rows to write for one schedule mutation
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDiff {
    /// Existing installments whose fields changed
    pub updated: Vec<Installment>,
    pub inserted: Vec<Installment>,
    /// Ids of deleted installments
    pub removed: Vec<String>,
    /// Full schedule after the edit, ordered by sequence
    pub schedule: Vec<Installment>,
    /// Recomputed student remaining amount
    pub remaining_amount: Decimal,
}

pub struct ScheduleEditor;

impl ScheduleEditor {
    /// Turns a plan into a concrete edit against `current`
    pub fn resolve(
        plan: &EditPlan,
        current: &[Installment],
        today: NaiveDate,
    ) -> Result<ScheduleEdit> {
        let edit = match plan {
            EditPlan::Statuses(updates) => ScheduleEdit {
                changes: updates
                    .iter()
                    .map(|u| InstallmentChange {
                        installment_id: u.installment_id.clone(),
                        status: Some(u.status),
                        payment_date: u.payment_date,
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            },
            EditPlan::Edit(edit) => edit.clone(),
            EditPlan::SettlePaidCount(paid_count) => {
                let paid_count = *paid_count as usize;
                if paid_count > current.len() {
                    return Err(AppError::validation(format!(
                        "Paid installment count ({}) exceeds the number of installments ({})",
                        paid_count,
                        current.len()
                    )));
                }

                let mut ordered: Vec<&Installment> = current.iter().collect();
                ordered.sort_by_key(|i| i.sequence);

                let changes = ordered
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, inst)| {
                        let status = if index < paid_count {
                            InstallmentStatus::Paid
                        } else if inst.is_paid() {
                            InstallmentStatus::Pending
                        } else {
                            return None;
                        };
                        Some(InstallmentChange {
                            installment_id: inst.id.clone(),
                            status: Some(status),
                            ..Default::default()
                        })
                    })
                    .collect();

                ScheduleEdit {
                    changes,
                    ..Default::default()
                }
            }
            EditPlan::MarkOverdue => ScheduleEdit {
                changes: current
                    .iter()
                    .filter(|i| i.status == InstallmentStatus::Pending && i.is_past_due(today))
                    .map(|i| InstallmentChange {
                        installment_id: i.id.clone(),
                        status: Some(InstallmentStatus::Overdue),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            },
            EditPlan::Recompute => ScheduleEdit::default(),
        };

        Ok(edit)
    }

    /// Applies `plan` to the ledger's current installments
    ///
    /// Fails without side effects when any part of the edit is invalid.
    pub fn apply(
        ledger: &StudentFeeLedger,
        batch_remaining: Decimal,
        current: Vec<Installment>,
        plan: &EditPlan,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<ScheduleDiff> {
        let edit = Self::resolve(plan, &current, today)?;

        let positions: HashMap<String, usize> = current
            .iter()
            .enumerate()
            .map(|(index, inst)| (inst.id.clone(), index))
            .collect();

        let mut removed = HashSet::new();
        for id in &edit.removals {
            if !positions.contains_key(id) {
                return Err(unknown_installment(id, ledger));
            }
            if !removed.insert(id.clone()) {
                return Err(AppError::validation(format!(
                    "Installment {} is listed for removal more than once",
                    id
                )));
            }
        }

        let mut schedule = current;
        let mut changed = HashSet::new();
        let mut seen = HashSet::new();

        for change in &edit.changes {
            let index = *positions
                .get(&change.installment_id)
                .ok_or_else(|| unknown_installment(&change.installment_id, ledger))?;

            if removed.contains(&change.installment_id) {
                return Err(AppError::validation(format!(
                    "Installment {} cannot be both changed and removed",
                    change.installment_id
                )));
            }
            if !seen.insert(change.installment_id.clone()) {
                return Err(AppError::validation(format!(
                    "Installment {} is changed more than once",
                    change.installment_id
                )));
            }

            let inst = &mut schedule[index];
            let before = inst.clone();
            apply_change(inst, change, today)?;

            if *inst != before {
                inst.updated_at = now;
                changed.insert(index);
            }
        }

        let mut next_sequence = schedule.iter().map(|i| i.sequence).max().unwrap_or(0) + 1;
        let mut inserted = Vec::with_capacity(edit.additions.len());
        for (offset, addition) in edit.additions.iter().enumerate() {
            money::validate_amount(&format!("New installment {} amount", offset + 1), addition.amount)?;

            let mut inst = Installment::pending(
                ledger.id.clone(),
                next_sequence,
                addition.due_date,
                addition.amount,
                addition.repayment_period_days,
                now,
            );
            inst.transition(
                addition.status.unwrap_or(InstallmentStatus::Pending),
                addition.payment_date,
                today,
            )?;

            next_sequence += 1;
            inserted.push(inst);
        }

        let updated: Vec<Installment> = schedule
            .iter()
            .enumerate()
            .filter(|(index, _)| changed.contains(index))
            .map(|(_, inst)| inst.clone())
            .collect();

        schedule.retain(|inst| !removed.contains(&inst.id));
        schedule.extend(inserted.iter().cloned());
        schedule.sort_by_key(|inst| inst.sequence);

        let remaining_amount = BalanceCalculator::recompute_remaining(batch_remaining, &schedule);

        Ok(ScheduleDiff {
            updated,
            inserted,
            removed: edit.removals,
            schedule,
            remaining_amount,
        })
    }
}

fn apply_change(inst: &mut Installment, change: &InstallmentChange, today: NaiveDate) -> Result<()> {
    if let Some(amount) = change.amount {
        money::validate_amount(&format!("Installment {} amount", inst.sequence), amount)?;
        inst.amount = amount;
    }

    if let Some(due_date) = change.due_date {
        inst.due_date = due_date;
    }

    match (change.status, change.payment_date) {
        (Some(status), payment_date) => inst.transition(status, payment_date, today)?,
        (None, Some(payment_date)) if inst.is_paid() => inst.payment_date = Some(payment_date),
        (None, Some(_)) => {
            return Err(AppError::validation(format!(
                "Installment {}: a payment date is only accepted with status paid",
                inst.sequence
            )))
        }
        (None, None) => {}
    }

    Ok(())
}

fn unknown_installment(id: &str, ledger: &StudentFeeLedger) -> AppError {
    AppError::validation(format!(
        "Installment {} does not belong to student fee ledger {}",
        id, ledger.id
    ))
}
