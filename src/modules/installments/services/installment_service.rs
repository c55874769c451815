// InstallmentService: student fee ledgers and their schedules
//
// Implements:
// - Ensure-exists for a student's ledger (snapshot of the batch remaining amount)
// - Idempotent schedule materialization from the batch's templates
// - Status updates, administrator edits, paid-count settlement and overdue sweeps,
//   each ending with the balance recompute
// - Fee summaries

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::core::{AppError, Clock, Ensured, Result};
use crate::modules::fees::services::FeeService;
use crate::modules::installments::{
    models::{
        EditPlan, FeeSummary, MaterializeOutcome, ScheduleEdit, ScheduleState, StatusUpdate,
        StudentFeeLedger,
    },
    repositories::InstallmentRepository,
    services::InstallmentScheduler,
};

/// Service for student schedules
#[derive(Clone)]
pub struct InstallmentService {
    fees: FeeService,
    repository: Arc<dyn InstallmentRepository>,
    clock: Arc<dyn Clock>,
    overdue_sweep_on_read: bool,
}

impl InstallmentService {
    pub fn new(
        fees: FeeService,
        repository: Arc<dyn InstallmentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fees,
            repository,
            clock,
            overdue_sweep_on_read: false,
        }
    }

    /// Marks past-due installments overdue before every schedule read
    pub fn with_overdue_sweep_on_read(mut self, enabled: bool) -> Self {
        self.overdue_sweep_on_read = enabled;
        self
    }

    /// Returns the student's ledger in the batch, opening it if absent
    pub async fn open_student_ledger(
        &self,
        batch_id: &str,
        user_id: i64,
    ) -> Result<Ensured<StudentFeeLedger>> {
        let batch_ledger = self.fees.ensure_batch_ledger(batch_id).await?.into_inner();

        let ensured = self
            .repository
            .ensure_ledger(StudentFeeLedger::open(&batch_ledger, user_id, self.clock.now()))
            .await?;

        if ensured.was_created() {
            info!(
                batch_id,
                user_id,
                student_fee_id = ensured.get().id.as_str(),
                remaining_amount = %ensured.get().remaining_amount,
                "Student fee ledger opened"
            );
        }

        Ok(ensured)
    }

    pub async fn get_ledger(&self, student_fee_id: &str) -> Result<StudentFeeLedger> {
        self.repository
            .find_ledger_by_id(student_fee_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Student fee ledger {} not found", student_fee_id))
            })
    }

    pub async fn find_student_ledger(
        &self,
        batch_id: &str,
        user_id: i64,
    ) -> Result<StudentFeeLedger> {
        self.repository
            .find_ledger(batch_id, user_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No fee ledger for user {} in batch {}",
                    user_id, batch_id
                ))
            })
    }

    pub async fn list_batch_ledgers(&self, batch_id: &str) -> Result<Vec<StudentFeeLedger>> {
        self.repository.list_ledgers_by_batch(batch_id).await
    }

    /// Creates the student's installments from the batch plan
    ///
    /// A ledger that already has installments is left untouched and reported
    /// as `AlreadyScheduled`.
    pub async fn materialize_schedule(
        &self,
        student_fee_id: &str,
        anchor_date: NaiveDate,
    ) -> Result<MaterializeOutcome> {
        let ledger = self.get_ledger(student_fee_id).await?;
        let templates = self
            .fees
            .list_templates_for_ledger(&ledger.batch_fee_id)
            .await?;

        let schedule =
            InstallmentScheduler::build_schedule(&ledger, &templates, anchor_date, self.clock.now())?;

        let outcome = self
            .repository
            .insert_schedule_if_absent(&ledger.id, schedule)
            .await?;

        match &outcome {
            MaterializeOutcome::Materialized(installments) => info!(
                student_fee_id,
                anchor_date = %anchor_date,
                installments = installments.len(),
                "Schedule materialized"
            ),
            MaterializeOutcome::AlreadyScheduled(_) => {
                debug!(student_fee_id, "Schedule already materialized")
            }
        }

        Ok(outcome)
    }

    /// Ledger with its installments ordered by sequence
    pub async fn get_schedule(&self, student_fee_id: &str) -> Result<ScheduleState> {
        if self.overdue_sweep_on_read {
            return self.mark_overdue(student_fee_id).await;
        }

        let ledger = self.get_ledger(student_fee_id).await?;
        let installments = self.repository.list_installments(&ledger.id).await?;

        Ok(ScheduleState {
            ledger,
            installments,
        })
    }

    /// Applies a batch of status changes, then recomputes the balance
    pub async fn update_statuses(
        &self,
        student_fee_id: &str,
        updates: Vec<StatusUpdate>,
    ) -> Result<ScheduleState> {
        self.apply(student_fee_id, EditPlan::Statuses(updates)).await
    }

    /// Administrator edit: changes, additions and removals in one transaction
    pub async fn edit_schedule(
        &self,
        student_fee_id: &str,
        edit: ScheduleEdit,
    ) -> Result<ScheduleState> {
        self.apply(student_fee_id, EditPlan::Edit(edit)).await
    }

    /// Marks the first `paid_count` installments paid
    pub async fn settle_paid_count(
        &self,
        student_fee_id: &str,
        paid_count: u32,
    ) -> Result<ScheduleState> {
        self.apply(student_fee_id, EditPlan::SettlePaidCount(paid_count))
            .await
    }

    /// Pending installments due before today become overdue
    pub async fn mark_overdue(&self, student_fee_id: &str) -> Result<ScheduleState> {
        self.apply(student_fee_id, EditPlan::MarkOverdue).await
    }

    /// Re-anchors the balance on the batch's current remaining amount
    pub async fn recompute(&self, student_fee_id: &str) -> Result<ScheduleState> {
        self.apply(student_fee_id, EditPlan::Recompute).await
    }

    /// Recomputes every student ledger of the batch; returns how many were touched
    pub async fn recompute_batch(&self, batch_id: &str) -> Result<usize> {
        self.apply_to_batch(batch_id, EditPlan::Recompute).await
    }

    /// Overdue sweep over every student ledger of the batch
    pub async fn mark_overdue_batch(&self, batch_id: &str) -> Result<usize> {
        self.apply_to_batch(batch_id, EditPlan::MarkOverdue).await
    }

    pub async fn summary(&self, student_fee_id: &str) -> Result<FeeSummary> {
        let state = self.get_schedule(student_fee_id).await?;
        Ok(FeeSummary::from_schedule(&state.ledger, &state.installments))
    }

    async fn apply(&self, student_fee_id: &str, plan: EditPlan) -> Result<ScheduleState> {
        self.repository
            .apply_plan(
                student_fee_id,
                &plan,
                self.clock.today(),
                self.clock.now(),
            )
            .await
    }

    async fn apply_to_batch(&self, batch_id: &str, plan: EditPlan) -> Result<usize> {
        let ledgers = self.repository.list_ledgers_by_batch(batch_id).await?;

        for ledger in &ledgers {
            self.apply(&ledger.id, plan.clone()).await?;
        }

        info!(batch_id, ledgers = ledgers.len(), plan = ?plan, "Batch schedules updated");

        Ok(ledgers.len())
    }
}
