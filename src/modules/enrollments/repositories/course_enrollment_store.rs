// CourseEnrollmentStore: the course platform's enrollment records
//
// Enrolling is idempotent: an existing row is reactivated and keeps its
// original `created` timestamp, which anchors fee schedules.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::core::{AppError, Ensured, Result};
use crate::modules::enrollments::models::CourseEnrollment;

#[async_trait]
pub trait CourseEnrollmentStore: Send + Sync {
    /// Enrolls the user, reactivating an inactive enrollment
    async fn enroll(
        &self,
        user_id: i64,
        course_id: &str,
        now: NaiveDateTime,
    ) -> Result<Ensured<CourseEnrollment>>;

    /// Deactivates the enrollment; returns false when there was none
    async fn unenroll(&self, user_id: i64, course_id: &str) -> Result<bool>;

    async fn find(&self, user_id: i64, course_id: &str) -> Result<Option<CourseEnrollment>>;

    async fn is_enrolled(&self, user_id: i64, course_id: &str) -> Result<bool> {
        Ok(self
            .find(user_id, course_id)
            .await?
            .map(|e| e.is_active)
            .unwrap_or(false))
    }

    /// Schedule anchor for the user in the course
    async fn enrollment_date(&self, user_id: i64, course_id: &str) -> Result<NaiveDate> {
        self.find(user_id, course_id)
            .await?
            .map(|e| e.anchor_date())
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "User {} is not enrolled in course {}",
                    user_id, course_id
                ))
            })
    }
}

/// MySQL implementation over `course_enrollments`
pub struct MySqlCourseEnrollmentStore {
    pool: MySqlPool,
}

impl MySqlCourseEnrollmentStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseEnrollmentStore for MySqlCourseEnrollmentStore {
    async fn enroll(
        &self,
        user_id: i64,
        course_id: &str,
        now: NaiveDateTime,
    ) -> Result<Ensured<CourseEnrollment>> {
        let mut tx = self.pool.begin().await?;

        // Ignored duplicates report zero rows
        let inserted = sqlx::query(
            r#"
            INSERT IGNORE INTO course_enrollments (user_id, course_id, created, is_active)
            VALUES (?, ?, ?, TRUE)
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected()
            == 1;

        if !inserted {
            sqlx::query(
                "UPDATE course_enrollments SET is_active = TRUE WHERE user_id = ? AND course_id = ?",
            )
            .bind(user_id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let stored = self.find(user_id, course_id).await?.ok_or_else(|| {
            AppError::internal(format!(
                "Enrollment of user {} in {} vanished after insert",
                user_id, course_id
            ))
        })?;

        Ok(if inserted {
            Ensured::Created(stored)
        } else {
            Ensured::Existing(stored)
        })
    }

    async fn unenroll(&self, user_id: i64, course_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE course_enrollments SET is_active = FALSE WHERE user_id = ? AND course_id = ?",
        )
        .bind(user_id)
        .bind(course_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        Ok(self.find(user_id, course_id).await?.is_some())
    }

    async fn find(&self, user_id: i64, course_id: &str) -> Result<Option<CourseEnrollment>> {
        let row = sqlx::query_as::<_, CourseEnrollmentRow>(
            r#"
            SELECT user_id, course_id, created, is_active
            FROM course_enrollments
            WHERE user_id = ? AND course_id = ?
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CourseEnrollment::from))
    }
}

#[derive(sqlx::FromRow)]
struct CourseEnrollmentRow {
    user_id: i64,
    course_id: String,
    created: NaiveDateTime,
    is_active: bool,
}

impl From<CourseEnrollmentRow> for CourseEnrollment {
    fn from(row: CourseEnrollmentRow) -> Self {
        Self {
            user_id: row.user_id,
            course_id: row.course_id,
            created: row.created,
            is_active: row.is_active,
        }
    }
}
