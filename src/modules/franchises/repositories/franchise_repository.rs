// FranchiseRepository: franchises, batches, registrations and batch membership

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Ensured, Result};
use crate::modules::franchises::models::{
    Batch, BatchEnrollment, BatchStudent, Franchise, StudentRegistration,
};

#[async_trait]
pub trait FranchiseRepository: Send + Sync {
    async fn insert_franchise(&self, franchise: &Franchise) -> Result<()>;

    /// Fails with `NotFound` when the franchise does not exist
    async fn update_franchise(&self, franchise: &Franchise) -> Result<()>;

    async fn find_franchise(&self, id: &str) -> Result<Option<Franchise>>;

    /// Franchises ordered by name
    async fn list_franchises(&self) -> Result<Vec<Franchise>>;

    async fn insert_batch(&self, batch: &Batch) -> Result<()>;

    async fn find_batch(&self, id: &str) -> Result<Option<Batch>>;

    /// Batches of a franchise ordered by start date
    async fn list_batches(&self, franchise_id: &str) -> Result<Vec<Batch>>;

    /// Update-or-create keyed by user id
    async fn upsert_registration(
        &self,
        registration: StudentRegistration,
    ) -> Result<Ensured<StudentRegistration>>;

    async fn find_registration(&self, user_id: i64) -> Result<Option<StudentRegistration>>;

    /// Inserts the membership unless the user is already in the batch
    async fn ensure_batch_enrollment(
        &self,
        enrollment: BatchEnrollment,
    ) -> Result<Ensured<BatchEnrollment>>;

    /// Members of a batch with their fee ledger, ordered by enrollment time
    async fn list_batch_students(&self, batch_id: &str) -> Result<Vec<BatchStudent>>;
}

/// MySQL implementation
pub struct MySqlFranchiseRepository {
    pool: MySqlPool,
}

impl MySqlFranchiseRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FranchiseRepository for MySqlFranchiseRepository {
    async fn insert_franchise(&self, franchise: &Franchise) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO franchises (id, name, location, joining_date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&franchise.id)
        .bind(&franchise.name)
        .bind(&franchise.location)
        .bind(franchise.joining_date)
        .bind(franchise.created_at)
        .bind(franchise.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_franchise(&self, franchise: &Franchise) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE franchises
            SET name = ?, location = ?, joining_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&franchise.name)
        .bind(&franchise.location)
        .bind(franchise.joining_date)
        .bind(franchise.updated_at)
        .bind(&franchise.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Franchise {} not found",
                franchise.id
            )));
        }

        Ok(())
    }

    async fn find_franchise(&self, id: &str) -> Result<Option<Franchise>> {
        let row = sqlx::query_as::<_, FranchiseRow>(
            "SELECT id, name, location, joining_date, created_at, updated_at FROM franchises WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Franchise::from))
    }

    async fn list_franchises(&self) -> Result<Vec<Franchise>> {
        let rows = sqlx::query_as::<_, FranchiseRow>(
            "SELECT id, name, location, joining_date, created_at, updated_at FROM franchises ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Franchise::from).collect())
    }

    async fn insert_batch(&self, batch: &Batch) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO batches (id, franchise_id, name, course_id, start_date, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&batch.id)
        .bind(&batch.franchise_id)
        .bind(&batch.name)
        .bind(&batch.course_id)
        .bind(batch.start_date)
        .bind(batch.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_batch(&self, id: &str) -> Result<Option<Batch>> {
        let row = sqlx::query_as::<_, BatchRow>(
            "SELECT id, franchise_id, name, course_id, start_date, created_at FROM batches WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Batch::from))
    }

    async fn list_batches(&self, franchise_id: &str) -> Result<Vec<Batch>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, franchise_id, name, course_id, start_date, created_at
            FROM batches
            WHERE franchise_id = ?
            ORDER BY start_date ASC, name ASC
            "#,
        )
        .bind(franchise_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Batch::from).collect())
    }

    async fn upsert_registration(
        &self,
        registration: StudentRegistration,
    ) -> Result<Ensured<StudentRegistration>> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT IGNORE INTO student_registrations (user_id, franchise_id, phone_number, address, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(registration.user_id)
        .bind(&registration.franchise_id)
        .bind(&registration.phone_number)
        .bind(&registration.address)
        .bind(registration.updated_at)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            sqlx::query(
                r#"
                UPDATE student_registrations
                SET franchise_id = ?, phone_number = ?, address = ?, updated_at = ?
                WHERE user_id = ?
                "#,
            )
            .bind(&registration.franchise_id)
            .bind(&registration.phone_number)
            .bind(&registration.address)
            .bind(registration.updated_at)
            .bind(registration.user_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(if inserted {
            Ensured::Created(registration)
        } else {
            Ensured::Existing(registration)
        })
    }

    async fn find_registration(&self, user_id: i64) -> Result<Option<StudentRegistration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(
            r#"
            SELECT user_id, franchise_id, phone_number, address, updated_at
            FROM student_registrations
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StudentRegistration::from))
    }

    async fn ensure_batch_enrollment(
        &self,
        enrollment: BatchEnrollment,
    ) -> Result<Ensured<BatchEnrollment>> {
        let inserted = sqlx::query(
            r#"
            INSERT IGNORE INTO batch_enrollments (id, batch_id, user_id, enrolled_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&enrollment.id)
        .bind(&enrollment.batch_id)
        .bind(enrollment.user_id)
        .bind(enrollment.enrolled_at)
        .execute(&self.pool)
        .await?
        .rows_affected()
            == 1;

        let stored = sqlx::query_as::<_, BatchEnrollmentRow>(
            r#"
            SELECT id, batch_id, user_id, enrolled_at
            FROM batch_enrollments
            WHERE batch_id = ? AND user_id = ?
            "#,
        )
        .bind(&enrollment.batch_id)
        .bind(enrollment.user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(BatchEnrollment::from)
        .ok_or_else(|| AppError::not_found(format!("Batch {} not found", enrollment.batch_id)))?;

        Ok(if inserted {
            Ensured::Created(stored)
        } else {
            Ensured::Existing(stored)
        })
    }

    async fn list_batch_students(&self, batch_id: &str) -> Result<Vec<BatchStudent>> {
        let rows = sqlx::query_as::<_, BatchStudentRow>(
            r#"
            SELECT
                e.user_id, e.enrolled_at, r.phone_number,
                s.id AS student_fee_id, s.remaining_amount
            FROM batch_enrollments e
            LEFT JOIN student_registrations r ON r.user_id = e.user_id
            LEFT JOIN student_fee_ledgers s ON s.batch_id = e.batch_id AND s.user_id = e.user_id
            WHERE e.batch_id = ?
            ORDER BY e.enrolled_at ASC, e.user_id ASC
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BatchStudent {
                user_id: row.user_id,
                enrolled_at: row.enrolled_at,
                phone_number: row.phone_number,
                student_fee_id: row.student_fee_id,
                remaining_amount: row.remaining_amount,
            })
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct FranchiseRow {
    id: String,
    name: String,
    location: String,
    joining_date: NaiveDate,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<FranchiseRow> for Franchise {
    fn from(row: FranchiseRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            location: row.location,
            joining_date: row.joining_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BatchRow {
    id: String,
    franchise_id: String,
    name: String,
    course_id: String,
    start_date: NaiveDate,
    created_at: NaiveDateTime,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Self {
            id: row.id,
            franchise_id: row.franchise_id,
            name: row.name,
            course_id: row.course_id,
            start_date: row.start_date,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RegistrationRow {
    user_id: i64,
    franchise_id: Option<String>,
    phone_number: Option<String>,
    address: Option<String>,
    updated_at: NaiveDateTime,
}

impl From<RegistrationRow> for StudentRegistration {
    fn from(row: RegistrationRow) -> Self {
        Self {
            user_id: row.user_id,
            franchise_id: row.franchise_id,
            phone_number: row.phone_number,
            address: row.address,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BatchEnrollmentRow {
    id: String,
    batch_id: String,
    user_id: i64,
    enrolled_at: NaiveDateTime,
}

impl From<BatchEnrollmentRow> for BatchEnrollment {
    fn from(row: BatchEnrollmentRow) -> Self {
        Self {
            id: row.id,
            batch_id: row.batch_id,
            user_id: row.user_id,
            enrolled_at: row.enrolled_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BatchStudentRow {
    user_id: i64,
    enrolled_at: NaiveDateTime,
    phone_number: Option<String>,
    student_fee_id: Option<String>,
    remaining_amount: Option<Decimal>,
}
