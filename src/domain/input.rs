//! Parsing of caller-supplied scalar strings.
//!
//! Everything arriving as text from outside (path segments, query strings,
//! CLI arguments) goes through here before it reaches a query.

use crate::error::AppError;
use chrono::NaiveDate;

/// Non-negative integer identifier.
pub fn parse_id(field: &str, raw: &str) -> Result<i64, AppError> {
    let id = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("{field} must be an integer, got '{raw}'")))?;
    if id < 0 {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    Ok(id)
}

/// Finite numeric threshold (integers and decimals accepted).
pub fn parse_threshold(field: &str, raw: &str) -> Result<f64, AppError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("{field} must be numeric, got '{raw}'")))?;
    if !value.is_finite() {
        return Err(AppError::Validation(format!("{field} must be a finite number")));
    }
    Ok(value)
}

/// Non-negative count.
pub fn parse_count(field: &str, raw: &str) -> Result<i64, AppError> {
    let n = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("{field} must be an integer, got '{raw}'")))?;
    if n < 0 {
        return Err(AppError::Validation(format!("{field} must not be negative")));
    }
    Ok(n)
}

pub fn parse_quantity(raw: &str) -> Result<i64, AppError> {
    parse_count("quantity", raw)
}

/// Rating on the 1..=5 scale.
pub fn parse_rating(field: &str, raw: &str) -> Result<i64, AppError> {
    let r = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::Validation(format!("{field} must be an integer, got '{raw}'")))?;
    check_rating(field, r)?;
    Ok(r)
}

pub fn check_rating(field: &str, value: i64) -> Result<(), AppError> {
    if !(1..=5).contains(&value) {
        return Err(AppError::Validation(format!(
            "{field} must be between 1 and 5, got {value}"
        )));
    }
    Ok(())
}

/// Calendar date in `YYYY-MM-DD` form.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{field} must be a YYYY-MM-DD date, got '{raw}'")))
}

/// Trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
