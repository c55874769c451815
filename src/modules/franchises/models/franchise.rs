use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AppError, Result};

pub const MAX_NAME_LENGTH: usize = 150;
pub const MAX_LOCATION_LENGTH: usize = 255;

/// A franchise running course batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Franchise {
    pub id: String,
    pub name: String,
    pub location: String,
    pub joining_date: NaiveDate,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Franchise fields accepted on register and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseInput {
    pub name: String,
    pub location: String,
    pub joining_date: NaiveDate,
}

impl FranchiseInput {
    pub fn new(name: impl Into<String>, location: impl Into<String>, joining_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            joining_date,
        }
    }

    /// Trimmed copy, rejected when a field is blank or too long
    pub fn normalized(&self) -> Result<Self> {
        Ok(Self {
            name: bounded_text("Franchise name", &self.name, MAX_NAME_LENGTH)?,
            location: bounded_text("Franchise location", &self.location, MAX_LOCATION_LENGTH)?,
            joining_date: self.joining_date,
        })
    }
}

impl Franchise {
    pub fn register(input: &FranchiseInput, now: NaiveDateTime) -> Result<Self> {
        let input = input.normalized()?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            location: input.location,
            joining_date: input.joining_date,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update(&mut self, input: &FranchiseInput, now: NaiveDateTime) -> Result<()> {
        let input = input.normalized()?;

        self.name = input.name;
        self.location = input.location;
        self.joining_date = input.joining_date;
        self.updated_at = now;

        Ok(())
    }
}

/// Trims `value` and checks it is non-empty and at most `max` characters
pub(crate) fn bounded_text(field: &str, value: &str, max: usize) -> Result<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }

    Ok(trimmed.to_string())
}
