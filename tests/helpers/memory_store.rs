// In-memory store
//
// Implements every repository trait over one mutex-guarded state so service
// and HTTP tests run without MySQL. Schedule mutations go through the same
// ScheduleEditor the MySQL repository uses; the mutex stands in for the row
// lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use franchise_fees::core::{AppError, Clock, Ensured, FixedClock, Result};
use franchise_fees::modules::enrollments::{models::CourseEnrollment, repositories::CourseEnrollmentStore};
use franchise_fees::modules::fees::{
    models::{BatchFeeLedger, InstallmentTemplate},
    repositories::FeeRepository,
};
use franchise_fees::modules::franchises::{
    models::{Batch, BatchEnrollment, BatchStudent, Franchise, StudentRegistration},
    repositories::FranchiseRepository,
};
use franchise_fees::modules::installments::{
    models::{EditPlan, Installment, MaterializeOutcome, Payment, ScheduleState, StudentFeeLedger},
    repositories::InstallmentRepository,
    services::ScheduleEditor,
};
use franchise_fees::modules::reports::{models::BatchFeeLine, repositories::ReportRepository};
use franchise_fees::{AppState, Repositories};

#[derive(Default)]
struct State {
    franchises: HashMap<String, Franchise>,
    batches: HashMap<String, Batch>,
    registrations: HashMap<i64, StudentRegistration>,
    batch_enrollments: Vec<BatchEnrollment>,
    course_enrollments: HashMap<(i64, String), CourseEnrollment>,
    batch_ledgers: HashMap<String, BatchFeeLedger>,
    templates: HashMap<String, Vec<InstallmentTemplate>>,
    student_ledgers: HashMap<String, StudentFeeLedger>,
    installments: HashMap<String, Vec<Installment>>,
    payments: HashMap<String, Payment>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Payment rows keyed by installment id
    pub async fn payments(&self) -> HashMap<String, Payment> {
        self.state.lock().await.payments.clone()
    }
}

/// Every repository seam backed by the same store
pub fn repositories(store: &Arc<MemoryStore>) -> Repositories {
    Repositories {
        franchises: store.clone(),
        fees: store.clone(),
        installments: store.clone(),
        enrollments: store.clone(),
        reports: store.clone(),
    }
}

/// Services over the store with the clock fixed at `today`
pub fn app_state(store: &Arc<MemoryStore>, today: NaiveDate) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(today));
    AppState::new(repositories(store), clock, false)
}

#[async_trait]
impl FranchiseRepository for MemoryStore {
    async fn insert_franchise(&self, franchise: &Franchise) -> Result<()> {
        self.state
            .lock()
            .await
            .franchises
            .insert(franchise.id.clone(), franchise.clone());
        Ok(())
    }

    async fn update_franchise(&self, franchise: &Franchise) -> Result<()> {
        let mut state = self.state.lock().await;
        match state.franchises.get_mut(&franchise.id) {
            Some(stored) => {
                *stored = franchise.clone();
                Ok(())
            }
            None => Err(AppError::not_found(format!(
                "Franchise {} not found",
                franchise.id
            ))),
        }
    }

    async fn find_franchise(&self, id: &str) -> Result<Option<Franchise>> {
        Ok(self.state.lock().await.franchises.get(id).cloned())
    }

    async fn list_franchises(&self) -> Result<Vec<Franchise>> {
        let mut list: Vec<Franchise> = self.state.lock().await.franchises.values().cloned().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn insert_batch(&self, batch: &Batch) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.franchises.contains_key(&batch.franchise_id) {
            return Err(AppError::not_found(format!(
                "Franchise {} not found",
                batch.franchise_id
            )));
        }
        state.batches.insert(batch.id.clone(), batch.clone());
        Ok(())
    }

    async fn find_batch(&self, id: &str) -> Result<Option<Batch>> {
        Ok(self.state.lock().await.batches.get(id).cloned())
    }

    async fn list_batches(&self, franchise_id: &str) -> Result<Vec<Batch>> {
        let mut list: Vec<Batch> = self
            .state
            .lock()
            .await
            .batches
            .values()
            .filter(|b| b.franchise_id == franchise_id)
            .cloned()
            .collect();
        list.sort_by_key(|b| b.start_date);
        Ok(list)
    }

    async fn upsert_registration(
        &self,
        registration: StudentRegistration,
    ) -> Result<Ensured<StudentRegistration>> {
        let previous = self
            .state
            .lock()
            .await
            .registrations
            .insert(registration.user_id, registration.clone());

        Ok(match previous {
            None => Ensured::Created(registration),
            Some(_) => Ensured::Existing(registration),
        })
    }

    async fn find_registration(&self, user_id: i64) -> Result<Option<StudentRegistration>> {
        Ok(self.state.lock().await.registrations.get(&user_id).cloned())
    }

    async fn ensure_batch_enrollment(
        &self,
        enrollment: BatchEnrollment,
    ) -> Result<Ensured<BatchEnrollment>> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state
            .batch_enrollments
            .iter()
            .find(|e| e.batch_id == enrollment.batch_id && e.user_id == enrollment.user_id)
        {
            return Ok(Ensured::Existing(existing.clone()));
        }

        state.batch_enrollments.push(enrollment.clone());
        Ok(Ensured::Created(enrollment))
    }

    async fn list_batch_students(&self, batch_id: &str) -> Result<Vec<BatchStudent>> {
        let state = self.state.lock().await;

        let mut students: Vec<BatchStudent> = state
            .batch_enrollments
            .iter()
            .filter(|e| e.batch_id == batch_id)
            .map(|e| {
                let ledger = state
                    .student_ledgers
                    .values()
                    .find(|l| l.batch_id == batch_id && l.user_id == e.user_id);
                BatchStudent {
                    user_id: e.user_id,
                    enrolled_at: e.enrolled_at,
                    phone_number: state
                        .registrations
                        .get(&e.user_id)
                        .and_then(|r| r.phone_number.clone()),
                    student_fee_id: ledger.map(|l| l.id.clone()),
                    remaining_amount: ledger.map(|l| l.remaining_amount),
                }
            })
            .collect();

        students.sort_by_key(|s| (s.enrolled_at, s.user_id));
        Ok(students)
    }
}

#[async_trait]
impl FeeRepository for MemoryStore {
    async fn ensure_ledger(&self, ledger: BatchFeeLedger) -> Result<Ensured<BatchFeeLedger>> {
        let mut state = self.state.lock().await;

        if !state.batches.contains_key(&ledger.batch_id) {
            return Err(AppError::not_found(format!(
                "Batch {} not found",
                ledger.batch_id
            )));
        }

        if let Some(existing) = state
            .batch_ledgers
            .values()
            .find(|l| l.batch_id == ledger.batch_id)
        {
            return Ok(Ensured::Existing(existing.clone()));
        }

        state.batch_ledgers.insert(ledger.id.clone(), ledger.clone());
        Ok(Ensured::Created(ledger))
    }

    async fn find_by_batch(&self, batch_id: &str) -> Result<Option<BatchFeeLedger>> {
        Ok(self
            .state
            .lock()
            .await
            .batch_ledgers
            .values()
            .find(|l| l.batch_id == batch_id)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BatchFeeLedger>> {
        Ok(self.state.lock().await.batch_ledgers.get(id).cloned())
    }

    async fn update_fees(&self, ledger: &BatchFeeLedger) -> Result<BatchFeeLedger> {
        let mut state = self.state.lock().await;
        let stored = state
            .batch_ledgers
            .get_mut(&ledger.id)
            .ok_or_else(|| AppError::not_found(format!("Batch fee ledger {} not found", ledger.id)))?;

        stored.total_fee = ledger.total_fee;
        stored.discount = ledger.discount;
        stored.remaining_amount = ledger.remaining_amount;
        stored.updated_at = ledger.updated_at;
        Ok(stored.clone())
    }

    async fn update_installment_defaults(&self, ledger: &BatchFeeLedger) -> Result<BatchFeeLedger> {
        let mut state = self.state.lock().await;
        let stored = state
            .batch_ledgers
            .get_mut(&ledger.id)
            .ok_or_else(|| AppError::not_found(format!("Batch fee ledger {} not found", ledger.id)))?;

        stored.installment_amount = ledger.installment_amount;
        stored.repayment_period_days = ledger.repayment_period_days;
        stored.updated_at = ledger.updated_at;
        Ok(stored.clone())
    }

    async fn replace_templates(
        &self,
        batch_fee_id: &str,
        templates: &[InstallmentTemplate],
    ) -> Result<()> {
        self.state
            .lock()
            .await
            .templates
            .insert(batch_fee_id.to_string(), templates.to_vec());
        Ok(())
    }

    async fn list_templates(&self, batch_fee_id: &str) -> Result<Vec<InstallmentTemplate>> {
        let mut list = self
            .state
            .lock()
            .await
            .templates
            .get(batch_fee_id)
            .cloned()
            .unwrap_or_default();
        list.sort_by_key(|t| t.position);
        Ok(list)
    }
}

#[async_trait]
impl InstallmentRepository for MemoryStore {
    async fn ensure_ledger(&self, ledger: StudentFeeLedger) -> Result<Ensured<StudentFeeLedger>> {
        let mut state = self.state.lock().await;

        if !state.batch_ledgers.contains_key(&ledger.batch_fee_id) {
            return Err(AppError::not_found(format!(
                "Batch fee ledger {} not found",
                ledger.batch_fee_id
            )));
        }

        if let Some(existing) = state
            .student_ledgers
            .values()
            .find(|l| l.batch_id == ledger.batch_id && l.user_id == ledger.user_id)
        {
            return Ok(Ensured::Existing(existing.clone()));
        }

        state.student_ledgers.insert(ledger.id.clone(), ledger.clone());
        Ok(Ensured::Created(ledger))
    }

    async fn find_ledger(&self, batch_id: &str, user_id: i64) -> Result<Option<StudentFeeLedger>> {
        Ok(self
            .state
            .lock()
            .await
            .student_ledgers
            .values()
            .find(|l| l.batch_id == batch_id && l.user_id == user_id)
            .cloned())
    }

    async fn find_ledger_by_id(&self, id: &str) -> Result<Option<StudentFeeLedger>> {
        Ok(self.state.lock().await.student_ledgers.get(id).cloned())
    }

    async fn list_ledgers_by_batch(&self, batch_id: &str) -> Result<Vec<StudentFeeLedger>> {
        let mut list: Vec<StudentFeeLedger> = self
            .state
            .lock()
            .await
            .student_ledgers
            .values()
            .filter(|l| l.batch_id == batch_id)
            .cloned()
            .collect();
        list.sort_by_key(|l| l.user_id);
        Ok(list)
    }

    async fn list_installments(&self, student_fee_id: &str) -> Result<Vec<Installment>> {
        let mut list = self
            .state
            .lock()
            .await
            .installments
            .get(student_fee_id)
            .cloned()
            .unwrap_or_default();
        list.sort_by_key(|i| i.sequence);
        Ok(list)
    }

    async fn insert_schedule_if_absent(
        &self,
        student_fee_id: &str,
        schedule: Vec<Installment>,
    ) -> Result<MaterializeOutcome> {
        let mut state = self.state.lock().await;

        if !state.student_ledgers.contains_key(student_fee_id) {
            return Err(AppError::not_found(format!(
                "Student fee ledger {} not found",
                student_fee_id
            )));
        }

        if let Some(existing) = state
            .installments
            .get(student_fee_id)
            .filter(|list| !list.is_empty())
        {
            return Ok(MaterializeOutcome::AlreadyScheduled(existing.clone()));
        }

        state
            .installments
            .insert(student_fee_id.to_string(), schedule.clone());
        Ok(MaterializeOutcome::Materialized(schedule))
    }

    async fn apply_plan(
        &self,
        student_fee_id: &str,
        plan: &EditPlan,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<ScheduleState> {
        let mut state = self.state.lock().await;

        let mut ledger = state
            .student_ledgers
            .get(student_fee_id)
            .cloned()
            .ok_or_else(|| {
                AppError::not_found(format!("Student fee ledger {} not found", student_fee_id))
            })?;
        let batch_remaining = state
            .batch_ledgers
            .get(&ledger.batch_fee_id)
            .map(|b| b.remaining_amount)
            .unwrap_or(Decimal::ZERO);

        let mut current = state
            .installments
            .get(student_fee_id)
            .cloned()
            .unwrap_or_default();
        current.sort_by_key(|i| i.sequence);

        let diff = ScheduleEditor::apply(&ledger, batch_remaining, current, plan, today, now)?;

        for id in &diff.removed {
            state.payments.remove(id);
        }
        for installment in diff.updated.iter().chain(diff.inserted.iter()) {
            match Payment::for_installment(installment, now) {
                Some(payment) => {
                    state.payments.insert(installment.id.clone(), payment);
                }
                None => {
                    state.payments.remove(&installment.id);
                }
            }
        }

        ledger.remaining_amount = diff.remaining_amount;
        ledger.updated_at = now;

        state
            .installments
            .insert(student_fee_id.to_string(), diff.schedule.clone());
        state
            .student_ledgers
            .insert(ledger.id.clone(), ledger.clone());

        Ok(ScheduleState {
            ledger,
            installments: diff.schedule,
        })
    }
}

#[async_trait]
impl CourseEnrollmentStore for MemoryStore {
    async fn enroll(
        &self,
        user_id: i64,
        course_id: &str,
        now: NaiveDateTime,
    ) -> Result<Ensured<CourseEnrollment>> {
        let mut state = self.state.lock().await;
        let key = (user_id, course_id.to_string());

        match state.course_enrollments.get_mut(&key) {
            Some(existing) => {
                existing.is_active = true;
                Ok(Ensured::Existing(existing.clone()))
            }
            None => {
                let enrollment = CourseEnrollment::new(user_id, course_id, now);
                state.course_enrollments.insert(key, enrollment.clone());
                Ok(Ensured::Created(enrollment))
            }
        }
    }

    async fn unenroll(&self, user_id: i64, course_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        match state
            .course_enrollments
            .get_mut(&(user_id, course_id.to_string()))
        {
            Some(existing) => {
                existing.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find(&self, user_id: i64, course_id: &str) -> Result<Option<CourseEnrollment>> {
        Ok(self
            .state
            .lock()
            .await
            .course_enrollments
            .get(&(user_id, course_id.to_string()))
            .cloned())
    }
}

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn batch_fee_lines(&self, franchise_id: &str) -> Result<Vec<BatchFeeLine>> {
        let state = self.state.lock().await;

        let mut batches: Vec<&Batch> = state
            .batches
            .values()
            .filter(|b| b.franchise_id == franchise_id)
            .collect();
        batches.sort_by(|a, b| (a.start_date, &a.name).cmp(&(b.start_date, &b.name)));

        Ok(batches
            .into_iter()
            .map(|batch| {
                let batch_ledger = state
                    .batch_ledgers
                    .values()
                    .find(|l| l.batch_id == batch.id);
                let students: Vec<&StudentFeeLedger> = batch_ledger
                    .map(|bl| {
                        state
                            .student_ledgers
                            .values()
                            .filter(|s| s.batch_fee_id == bl.id)
                            .collect()
                    })
                    .unwrap_or_default();

                let remaining = batch_ledger
                    .map(|l| l.remaining_amount)
                    .unwrap_or(Decimal::ZERO);
                let student_count = students.len() as i64;
                let collected: Decimal = students
                    .iter()
                    .filter_map(|s| state.installments.get(&s.id))
                    .flatten()
                    .filter(|i| i.is_paid())
                    .map(|i| i.amount)
                    .sum();

                BatchFeeLine::new(
                    batch.id.clone(),
                    batch.name.clone(),
                    student_count,
                    remaining * Decimal::from(student_count),
                    collected,
                )
            })
            .collect())
    }
}
