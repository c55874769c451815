use rust_decimal::Decimal;

use crate::core::{AppError, Result};

/// Fee amounts are stored as DECIMAL(12, 2)
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a DECIMAL(12, 2) column holds
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999_99, MONEY_SCALE)
}

/// Rounds a value to the stored scale
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp(MONEY_SCALE)
}

/// Validates a fee amount supplied by a caller
///
/// Amounts must be non-negative, have at most two decimal places and fit
/// the storage column.
pub fn validate_amount(field: &str, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(AppError::validation(format!(
            "{} cannot be negative, got {}",
            field, amount
        )));
    }

    if amount.scale() > MONEY_SCALE && amount != round(amount) {
        return Err(AppError::validation(format!(
            "{} must have at most {} decimal places, got {}",
            field, MONEY_SCALE, amount
        )));
    }

    if amount > max_amount() {
        return Err(AppError::validation(format!(
            "{} exceeds the maximum of {}",
            field,
            max_amount()
        )));
    }

    Ok(())
}
