use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Ensured, Result};
use crate::modules::enrollments::models::CourseEnrollment;
use crate::modules::installments::models::{MaterializeOutcome, StudentFeeLedger};

const MAX_PHONE_LENGTH: usize = 20;

/// Franchise contact details of a platform user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRegistration {
    pub user_id: i64,
    pub franchise_id: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub franchise_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl StudentRegistration {
    /// Registration record for `user_id`; blank optional fields become `None`
    pub fn from_input(user_id: i64, input: &RegistrationInput, now: NaiveDateTime) -> Result<Self> {
        let phone_number = non_blank(&input.phone_number);
        if let Some(phone) = &phone_number {
            if phone.chars().count() > MAX_PHONE_LENGTH {
                return Err(AppError::validation(format!(
                    "Phone number must be at most {} characters",
                    MAX_PHONE_LENGTH
                )));
            }
        }

        Ok(Self {
            user_id,
            franchise_id: non_blank(&input.franchise_id),
            phone_number,
            address: non_blank(&input.address),
            updated_at: now,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Membership of a user in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEnrollment {
    pub id: String,
    pub batch_id: String,
    pub user_id: i64,
    pub enrolled_at: NaiveDateTime,
}

impl BatchEnrollment {
    pub fn new(batch_id: impl Into<String>, user_id: i64, now: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            batch_id: batch_id.into(),
            user_id,
            enrolled_at: now,
        }
    }
}

/// Everything `enroll_student` ensured, each reporting whether it was new
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentEnrollment {
    pub membership: Ensured<BatchEnrollment>,
    pub course_enrollment: Ensured<CourseEnrollment>,
    pub ledger: Ensured<StudentFeeLedger>,
    pub schedule: MaterializeOutcome,
}

/// Row of a batch's student list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchStudent {
    pub user_id: i64,
    pub enrolled_at: NaiveDateTime,
    pub phone_number: Option<String>,
    pub student_fee_id: Option<String>,
    pub remaining_amount: Option<Decimal>,
}
