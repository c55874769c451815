// InstallmentRepository: student fee ledgers and their installments
//
// Implements:
// - Ensure one ledger per (batch, student) (insert-if-absent)
// - Materialize a schedule once per ledger under a row lock
// - Execute an EditPlan in one transaction: lock, read, resolve, write, recompute
// - Keep the payments table in step with paid installments

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::info;

use crate::core::{AppError, Ensured, Result};
use crate::modules::installments::models::{
    EditPlan, Installment, InstallmentStatus, MaterializeOutcome, Payment, ScheduleState,
    StudentFeeLedger,
};
use crate::modules::installments::services::ScheduleEditor;

/// Persistence seam for student ledgers and installments
#[async_trait]
pub trait InstallmentRepository: Send + Sync {
    /// Inserts `ledger` unless the student already has one in the batch
    ///
    /// Fails with `NotFound` when the batch fee ledger does not exist.
    async fn ensure_ledger(&self, ledger: StudentFeeLedger) -> Result<Ensured<StudentFeeLedger>>;

    async fn find_ledger(&self, batch_id: &str, user_id: i64) -> Result<Option<StudentFeeLedger>>;

    async fn find_ledger_by_id(&self, id: &str) -> Result<Option<StudentFeeLedger>>;

    /// Student ledgers of a batch ordered by user id
    async fn list_ledgers_by_batch(&self, batch_id: &str) -> Result<Vec<StudentFeeLedger>>;

    /// Installments ordered by sequence
    async fn list_installments(&self, student_fee_id: &str) -> Result<Vec<Installment>>;

    /// Stores `schedule` unless the ledger already has installments
    async fn insert_schedule_if_absent(
        &self,
        student_fee_id: &str,
        schedule: Vec<Installment>,
    ) -> Result<MaterializeOutcome>;

    /// Executes `plan` against the ledger and recomputes its remaining amount
    async fn apply_plan(
        &self,
        student_fee_id: &str,
        plan: &EditPlan,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<ScheduleState>;
}

/// MySQL implementation
pub struct MySqlInstallmentRepository {
    pool: MySqlPool,
}

impl MySqlInstallmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn lock_ledger(
        tx: &mut Transaction<'_, MySql>,
        student_fee_id: &str,
    ) -> Result<LockedLedgerRow> {
        // Locks the batch fee row as well, so fee edits and recomputes serialize
        sqlx::query_as::<_, LockedLedgerRow>(
            r#"
            SELECT
                s.id, s.batch_fee_id, s.batch_id, s.user_id, s.remaining_amount,
                s.created_at, s.updated_at, b.remaining_amount AS batch_remaining
            FROM student_fee_ledgers s
            JOIN batch_fee_ledgers b ON b.id = s.batch_fee_id
            WHERE s.id = ?
            FOR UPDATE
            "#,
        )
        .bind(student_fee_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::not_found(format!("Student fee ledger {} not found", student_fee_id))
        })
    }

    async fn fetch_installments(
        tx: &mut Transaction<'_, MySql>,
        student_fee_id: &str,
    ) -> Result<Vec<Installment>> {
        let rows = sqlx::query_as::<_, InstallmentRow>(&format!(
            "SELECT {} FROM installments WHERE student_fee_id = ? ORDER BY sequence ASC",
            INSTALLMENT_COLUMNS
        ))
        .bind(student_fee_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.into_iter().map(Installment::try_from).collect()
    }

    async fn insert_installment(
        tx: &mut Transaction<'_, MySql>,
        installment: &Installment,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO installments (
                id, student_fee_id, sequence, due_date, amount, status,
                payment_date, repayment_period_days, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&installment.id)
        .bind(&installment.student_fee_id)
        .bind(installment.sequence)
        .bind(installment.due_date)
        .bind(installment.amount)
        .bind(installment.status.as_str())
        .bind(installment.payment_date)
        .bind(installment.repayment_period_days)
        .bind(installment.created_at)
        .bind(installment.updated_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn update_installment(
        tx: &mut Transaction<'_, MySql>,
        installment: &Installment,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE installments
            SET
                due_date = ?,
                amount = ?,
                status = ?,
                payment_date = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(installment.due_date)
        .bind(installment.amount)
        .bind(installment.status.as_str())
        .bind(installment.payment_date)
        .bind(installment.updated_at)
        .bind(&installment.id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Upserts the payment row of a paid installment, deletes it otherwise
    async fn sync_payment(
        tx: &mut Transaction<'_, MySql>,
        installment: &Installment,
        now: NaiveDateTime,
    ) -> Result<()> {
        match Payment::for_installment(installment, now) {
            Some(payment) => {
                sqlx::query(
                    r#"
                    INSERT INTO payments (id, installment_id, payment_date, amount, created_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON DUPLICATE KEY UPDATE
                        payment_date = VALUES(payment_date),
                        amount = VALUES(amount)
                    "#,
                )
                .bind(&payment.id)
                .bind(&payment.installment_id)
                .bind(payment.payment_date)
                .bind(payment.amount)
                .bind(payment.created_at)
                .execute(&mut **tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM payments WHERE installment_id = ?")
                    .bind(&installment.id)
                    .execute(&mut **tx)
                    .await?;
            }
        }

        Ok(())
    }
}

const LEDGER_COLUMNS: &str =
    "id, batch_fee_id, batch_id, user_id, remaining_amount, created_at, updated_at";

const INSTALLMENT_COLUMNS: &str = "id, student_fee_id, sequence, due_date, amount, status, \
     payment_date, repayment_period_days, created_at, updated_at";

#[async_trait]
impl InstallmentRepository for MySqlInstallmentRepository {
    async fn ensure_ledger(&self, ledger: StudentFeeLedger) -> Result<Ensured<StudentFeeLedger>> {
        let inserted = sqlx::query(
            r#"
            INSERT IGNORE INTO student_fee_ledgers (
                id, batch_fee_id, batch_id, user_id, remaining_amount, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&ledger.id)
        .bind(&ledger.batch_fee_id)
        .bind(&ledger.batch_id)
        .bind(ledger.user_id)
        .bind(ledger.remaining_amount)
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        let stored = self
            .find_ledger(&ledger.batch_id, ledger.user_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Batch fee ledger {} not found",
                    ledger.batch_fee_id
                ))
            })?;

        Ok(if inserted {
            Ensured::Created(stored)
        } else {
            Ensured::Existing(stored)
        })
    }

    async fn find_ledger(&self, batch_id: &str, user_id: i64) -> Result<Option<StudentFeeLedger>> {
        let row = sqlx::query_as::<_, StudentFeeLedgerRow>(&format!(
            "SELECT {} FROM student_fee_ledgers WHERE batch_id = ? AND user_id = ?",
            LEDGER_COLUMNS
        ))
        .bind(batch_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StudentFeeLedger::from))
    }

    async fn find_ledger_by_id(&self, id: &str) -> Result<Option<StudentFeeLedger>> {
        let row = sqlx::query_as::<_, StudentFeeLedgerRow>(&format!(
            "SELECT {} FROM student_fee_ledgers WHERE id = ?",
            LEDGER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StudentFeeLedger::from))
    }

    async fn list_ledgers_by_batch(&self, batch_id: &str) -> Result<Vec<StudentFeeLedger>> {
        let rows = sqlx::query_as::<_, StudentFeeLedgerRow>(&format!(
            "SELECT {} FROM student_fee_ledgers WHERE batch_id = ? ORDER BY user_id ASC",
            LEDGER_COLUMNS
        ))
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StudentFeeLedger::from).collect())
    }

    async fn list_installments(&self, student_fee_id: &str) -> Result<Vec<Installment>> {
        let rows = sqlx::query_as::<_, InstallmentRow>(&format!(
            "SELECT {} FROM installments WHERE student_fee_id = ? ORDER BY sequence ASC",
            INSTALLMENT_COLUMNS
        ))
        .bind(student_fee_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Installment::try_from).collect()
    }

    async fn insert_schedule_if_absent(
        &self,
        student_fee_id: &str,
        schedule: Vec<Installment>,
    ) -> Result<MaterializeOutcome> {
        let mut tx = self.pool.begin().await?;

        Self::lock_ledger(&mut tx, student_fee_id).await?;

        let existing = Self::fetch_installments(&mut tx, student_fee_id).await?;
        if !existing.is_empty() {
            tx.rollback().await?;
            return Ok(MaterializeOutcome::AlreadyScheduled(existing));
        }

        for installment in &schedule {
            Self::insert_installment(&mut tx, installment).await?;
        }

        tx.commit().await?;

        Ok(MaterializeOutcome::Materialized(schedule))
    }

    async fn apply_plan(
        &self,
        student_fee_id: &str,
        plan: &EditPlan,
        today: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<ScheduleState> {
        let mut tx = self.pool.begin().await?;

        let locked = Self::lock_ledger(&mut tx, student_fee_id).await?;
        let batch_remaining = locked.batch_remaining;
        let mut ledger = StudentFeeLedger::from(locked);

        let current = Self::fetch_installments(&mut tx, student_fee_id).await?;

        // Nothing is written when the plan does not resolve
        let diff = ScheduleEditor::apply(&ledger, batch_remaining, current, plan, today, now)?;

        for id in &diff.removed {
            sqlx::query("DELETE FROM installments WHERE id = ? AND student_fee_id = ?")
                .bind(id)
                .bind(student_fee_id)
                .execute(&mut *tx)
                .await?;
        }

        for installment in &diff.updated {
            Self::update_installment(&mut tx, installment).await?;
            Self::sync_payment(&mut tx, installment, now).await?;
        }

        for installment in &diff.inserted {
            Self::insert_installment(&mut tx, installment).await?;
            if installment.status == InstallmentStatus::Paid {
                Self::sync_payment(&mut tx, installment, now).await?;
            }
        }

        ledger.remaining_amount = diff.remaining_amount;
        ledger.updated_at = now;

        sqlx::query("UPDATE student_fee_ledgers SET remaining_amount = ?, updated_at = ? WHERE id = ?")
            .bind(ledger.remaining_amount)
            .bind(ledger.updated_at)
            .bind(&ledger.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            student_fee_id,
            updated = diff.updated.len(),
            inserted = diff.inserted.len(),
            removed = diff.removed.len(),
            remaining_amount = %ledger.remaining_amount,
            "Applied schedule plan"
        );

        Ok(ScheduleState {
            ledger,
            installments: diff.schedule,
        })
    }
}

/// Database row for student_fee_ledgers
#[derive(sqlx::FromRow)]
struct StudentFeeLedgerRow {
    id: String,
    batch_fee_id: String,
    batch_id: String,
    user_id: i64,
    remaining_amount: Decimal,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<StudentFeeLedgerRow> for StudentFeeLedger {
    fn from(row: StudentFeeLedgerRow) -> Self {
        Self {
            id: row.id,
            batch_fee_id: row.batch_fee_id,
            batch_id: row.batch_id,
            user_id: row.user_id,
            remaining_amount: row.remaining_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Student ledger row joined with its batch's current remaining amount
#[derive(sqlx::FromRow)]
struct LockedLedgerRow {
    id: String,
    batch_fee_id: String,
    batch_id: String,
    user_id: i64,
    remaining_amount: Decimal,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    batch_remaining: Decimal,
}

impl From<LockedLedgerRow> for StudentFeeLedger {
    fn from(row: LockedLedgerRow) -> Self {
        Self {
            id: row.id,
            batch_fee_id: row.batch_fee_id,
            batch_id: row.batch_id,
            user_id: row.user_id,
            remaining_amount: row.remaining_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for installments
#[derive(sqlx::FromRow)]
struct InstallmentRow {
    id: String,
    student_fee_id: String,
    sequence: u32,
    due_date: NaiveDate,
    amount: Decimal,
    status: String,
    payment_date: Option<NaiveDate>,
    repayment_period_days: u32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<InstallmentRow> for Installment {
    type Error = AppError;

    fn try_from(row: InstallmentRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            student_fee_id: row.student_fee_id,
            sequence: row.sequence,
            due_date: row.due_date,
            amount: row.amount,
            status: InstallmentStatus::try_from(row.status)?,
            payment_date: row.payment_date,
            repayment_period_days: row.repayment_period_days,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
