use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A user's enrollment in a course, as recorded by the course platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEnrollment {
    pub user_id: i64,
    pub course_id: String,
    /// First enrollment time; re-enrolling keeps it
    pub created: NaiveDateTime,
    pub is_active: bool,
}

impl CourseEnrollment {
    pub fn new(user_id: i64, course_id: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            user_id,
            course_id: course_id.into(),
            created: now,
            is_active: true,
        }
    }

    /// Date the student's installment schedule is anchored at
    pub fn anchor_date(&self) -> NaiveDate {
        self.created.date()
    }
}
