use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Fee position of one franchise, batch by batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FranchiseFeeReport {
    pub franchise_id: String,
    pub franchise_name: String,
    pub generated_on: NaiveDate,
    pub batches: Vec<BatchFeeLine>,
    pub totals: FeeTotals,
}

/// Aggregates for one batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFeeLine {
    pub batch_id: String,
    pub batch_name: String,
    pub student_count: i64,
    /// Batch remaining amount times the number of student ledgers
    pub expected_total: Decimal,
    /// Sum of paid installment amounts
    pub collected: Decimal,
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeeTotals {
    pub student_count: i64,
    pub expected_total: Decimal,
    pub collected: Decimal,
    pub outstanding: Decimal,
}

impl BatchFeeLine {
    pub fn new(
        batch_id: impl Into<String>,
        batch_name: impl Into<String>,
        student_count: i64,
        expected_total: Decimal,
        collected: Decimal,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            batch_name: batch_name.into(),
            student_count,
            expected_total,
            collected,
            outstanding: expected_total - collected,
        }
    }
}

impl FranchiseFeeReport {
    pub fn new(
        franchise_id: impl Into<String>,
        franchise_name: impl Into<String>,
        generated_on: NaiveDate,
        batches: Vec<BatchFeeLine>,
    ) -> Self {
        let totals = batches.iter().fold(FeeTotals::default(), |acc, line| FeeTotals {
            student_count: acc.student_count + line.student_count,
            expected_total: acc.expected_total + line.expected_total,
            collected: acc.collected + line.collected,
            outstanding: acc.outstanding + line.outstanding,
        });

        Self {
            franchise_id: franchise_id.into(),
            franchise_name: franchise_name.into(),
            generated_on,
            batches,
            totals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
