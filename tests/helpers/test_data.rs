// Test Data Factory
//
// Request payloads and domain inputs for the service and HTTP tests.
// Names carry a UUID so runs against a shared MySQL database do not collide.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use franchise_fees::modules::fees::models::TemplateInput;
use franchise_fees::modules::franchises::models::{FranchiseInput, NewBatch};

/// Test data factory
pub struct TestDataFactory;

impl TestDataFactory {
    /// Unique name in the form "{prefix}-{uuid}"
    pub fn unique_name(prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }

    pub fn franchise_input() -> FranchiseInput {
        FranchiseInput::new(
            Self::unique_name("Franchise"),
            "12 Market Street",
            date(2023, 6, 1),
        )
    }

    /// Batch starting 2024-01-01 on course "course-v1:Academy+Fees+2024"
    pub fn new_batch() -> NewBatch {
        NewBatch {
            name: Self::unique_name("Batch"),
            course_id: "course-v1:Academy+Fees+2024".to_string(),
            start_date: date(2024, 1, 1),
        }
    }

    /// `count` installments of `amount`, each due `days` after the previous one
    pub fn even_plan(count: usize, amount: Decimal, days: u32) -> Vec<TemplateInput> {
        (0..count).map(|_| TemplateInput::new(amount, days)).collect()
    }

    pub fn franchise_payload() -> Value {
        json!({
            "name": Self::unique_name("Franchise"),
            "location": "12 Market Street",
            "joining_date": "2023-06-01"
        })
    }

    pub fn batch_payload() -> Value {
        json!({
            "name": Self::unique_name("Batch"),
            "course_id": "course-v1:Academy+Fees+2024",
            "start_date": "2024-01-01"
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
