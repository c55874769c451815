use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::franchise::{bounded_text, MAX_NAME_LENGTH};
use crate::core::Result;

const MAX_COURSE_ID_LENGTH: usize = 255;

/// A cohort of one franchise taking one course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub franchise_id: String,
    pub name: String,
    /// Course the batch's students are enrolled in
    pub course_id: String,
    pub start_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBatch {
    pub name: String,
    pub course_id: String,
    pub start_date: NaiveDate,
}

impl Batch {
    pub fn create(franchise_id: impl Into<String>, input: &NewBatch, now: NaiveDateTime) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            franchise_id: franchise_id.into(),
            name: bounded_text("Batch name", &input.name, MAX_NAME_LENGTH)?,
            course_id: bounded_text("Course id", &input.course_id, MAX_COURSE_ID_LENGTH)?,
            start_date: input.start_date,
            created_at: now,
        })
    }
}
