// FranchiseService: franchises, batches and student enrollment
//
// Implements:
// - Franchise registration and updates
// - Batch creation together with its fee ledger
// - Student registration (update-or-create per user)
// - Batch enrollment: membership, course enrollment, fee ledger and schedule

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::core::{AppError, Clock, Ensured, Result};
use crate::modules::enrollments::repositories::CourseEnrollmentStore;
use crate::modules::fees::{models::BatchFeeLedger, services::FeeService};
use crate::modules::franchises::{
    models::{
        Batch, BatchEnrollment, BatchStudent, Franchise, FranchiseInput, NewBatch,
        RegistrationInput, StudentEnrollment, StudentRegistration,
    },
    repositories::FranchiseRepository,
};
use crate::modules::installments::{
    models::{MaterializeOutcome, ScheduleState},
    services::InstallmentService,
};

/// A batch with the fee ledger created alongside it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchWithLedger {
    pub batch: Batch,
    pub fee_ledger: BatchFeeLedger,
}

#[derive(Clone)]
pub struct FranchiseService {
    repository: Arc<dyn FranchiseRepository>,
    enrollments: Arc<dyn CourseEnrollmentStore>,
    fees: FeeService,
    installments: InstallmentService,
    clock: Arc<dyn Clock>,
}

impl FranchiseService {
    pub fn new(
        repository: Arc<dyn FranchiseRepository>,
        enrollments: Arc<dyn CourseEnrollmentStore>,
        fees: FeeService,
        installments: InstallmentService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            enrollments,
            fees,
            installments,
            clock,
        }
    }

    pub async fn register_franchise(&self, input: &FranchiseInput) -> Result<Franchise> {
        let franchise = Franchise::register(input, self.clock.now())?;
        self.repository.insert_franchise(&franchise).await?;

        info!(franchise_id = franchise.id.as_str(), name = franchise.name.as_str(), "Franchise registered");

        Ok(franchise)
    }

    pub async fn update_franchise(&self, id: &str, input: &FranchiseInput) -> Result<Franchise> {
        let mut franchise = self.get_franchise(id).await?;
        franchise.update(input, self.clock.now())?;
        self.repository.update_franchise(&franchise).await?;

        Ok(franchise)
    }

    pub async fn get_franchise(&self, id: &str) -> Result<Franchise> {
        self.repository
            .find_franchise(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Franchise {} not found", id)))
    }

    pub async fn list_franchises(&self) -> Result<Vec<Franchise>> {
        self.repository.list_franchises().await
    }

    /// Creates the batch and its zero-valued fee ledger
    pub async fn create_batch(&self, franchise_id: &str, input: &NewBatch) -> Result<BatchWithLedger> {
        let franchise = self.get_franchise(franchise_id).await?;

        let batch = Batch::create(&franchise.id, input, self.clock.now())?;
        self.repository.insert_batch(&batch).await?;

        let fee_ledger = self.fees.ensure_batch_ledger(&batch.id).await?.into_inner();

        info!(
            franchise_id,
            batch_id = batch.id.as_str(),
            course_id = batch.course_id.as_str(),
            "Batch created"
        );

        Ok(BatchWithLedger { batch, fee_ledger })
    }

    pub async fn get_batch(&self, id: &str) -> Result<Batch> {
        self.repository
            .find_batch(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Batch {} not found", id)))
    }

    pub async fn list_batches(&self, franchise_id: &str) -> Result<Vec<Batch>> {
        self.get_franchise(franchise_id).await?;
        self.repository.list_batches(franchise_id).await
    }

    /// Records or replaces the user's franchise contact details
    pub async fn register_student(
        &self,
        user_id: i64,
        input: &RegistrationInput,
    ) -> Result<Ensured<StudentRegistration>> {
        let registration = StudentRegistration::from_input(user_id, input, self.clock.now())?;

        if let Some(franchise_id) = &registration.franchise_id {
            self.get_franchise(franchise_id).await?;
        }

        self.repository.upsert_registration(registration).await
    }

    pub async fn get_registration(&self, user_id: i64) -> Result<StudentRegistration> {
        self.repository
            .find_registration(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} is not registered", user_id)))
    }

    /// Enrolls the user in the batch and sets up their fees
    ///
    /// Every step is an ensure, so enrolling twice changes nothing the second
    /// time. The schedule is anchored at the course enrollment date.
    pub async fn enroll_student(&self, batch_id: &str, user_id: i64) -> Result<StudentEnrollment> {
        let batch = self.get_batch(batch_id).await?;
        let now = self.clock.now();

        let membership = self
            .repository
            .ensure_batch_enrollment(BatchEnrollment::new(&batch.id, user_id, now))
            .await?;

        let course_enrollment = self
            .enrollments
            .enroll(user_id, &batch.course_id, now)
            .await?;

        let ledger = self
            .installments
            .open_student_ledger(&batch.id, user_id)
            .await?;

        let schedule = self
            .installments
            .materialize_schedule(&ledger.get().id, course_enrollment.get().anchor_date())
            .await?;

        info!(
            batch_id,
            user_id,
            new_member = membership.was_created(),
            installments = schedule.installments().len(),
            "Student enrolled"
        );

        Ok(StudentEnrollment {
            membership,
            course_enrollment,
            ledger,
            schedule,
        })
    }

    /// Materializes a student ledger's schedule from its batch plan
    ///
    /// Anchored at the date the student was enrolled in the batch's course.
    pub async fn materialize_student_schedule(
        &self,
        student_fee_id: &str,
    ) -> Result<MaterializeOutcome> {
        let ledger = self.installments.get_ledger(student_fee_id).await?;
        let batch = self.get_batch(&ledger.batch_id).await?;
        let anchor_date = self
            .enrollments
            .enrollment_date(ledger.user_id, &batch.course_id)
            .await?;

        self.installments
            .materialize_schedule(&ledger.id, anchor_date)
            .await
    }

    pub async fn list_batch_students(&self, batch_id: &str) -> Result<Vec<BatchStudent>> {
        self.get_batch(batch_id).await?;
        self.repository.list_batch_students(batch_id).await
    }

    /// Fee schedule of one student of the batch
    pub async fn student_schedule(&self, batch_id: &str, user_id: i64) -> Result<ScheduleState> {
        let ledger = self
            .installments
            .find_student_ledger(batch_id, user_id)
            .await?;
        self.installments.get_schedule(&ledger.id).await
    }
}
