use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{money, AppError, Result};

/// One step of a batch's payment plan, before it is bound to a student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentTemplate {
    pub id: String,
    pub batch_fee_id: String,
    /// 1-based insertion order; determines cumulative due-date offsets
    pub position: u32,
    pub amount: Decimal,
    /// Days after the previous installment
    pub repayment_period_days: u32,
    pub created_at: NaiveDateTime,
}

/// Caller-supplied template, one entry of an ordered replacement list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateInput {
    pub amount: Decimal,
    pub repayment_period_days: u32,
}

impl TemplateInput {
    pub fn new(amount: Decimal, repayment_period_days: u32) -> Self {
        Self {
            amount,
            repayment_period_days,
        }
    }
}

/// Upper bound on templates per batch
pub const MAX_TEMPLATES: usize = 120;

impl InstallmentTemplate {
    /// Validates a replacement list as a unit and builds the templates
    ///
    /// Nothing is returned unless every entry is valid, so a caller can
    /// replace the stored plan in one step.
    pub fn build_plan(
        batch_fee_id: &str,
        inputs: &[TemplateInput],
        now: NaiveDateTime,
    ) -> Result<Vec<InstallmentTemplate>> {
        if inputs.len() > MAX_TEMPLATES {
            return Err(AppError::validation(format!(
                "At most {} installment templates are allowed, got {}",
                MAX_TEMPLATES,
                inputs.len()
            )));
        }

        for (index, input) in inputs.iter().enumerate() {
            money::validate_amount(&format!("Template {} amount", index + 1), input.amount)?;
        }

        Ok(inputs
            .iter()
            .enumerate()
            .map(|(index, input)| InstallmentTemplate {
                id: Uuid::new_v4().to_string(),
                batch_fee_id: batch_fee_id.to_string(),
                position: index as u32 + 1,
                amount: input.amount,
                repayment_period_days: input.repayment_period_days,
                created_at: now,
            })
            .collect())
    }

    /// Sum of template amounts
    pub fn plan_total(templates: &[InstallmentTemplate]) -> Decimal {
        templates.iter().map(|t| t.amount).sum()
    }
}
