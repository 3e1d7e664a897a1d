//! Shared field validators.
//!
//! The front desk checks the same shapes on every entity (mobile, aadhaar,
//! zip, dates, identifier widths, amount bounds). They live here once
//! instead of being re-declared per entity.

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use thiserror::Error;

/// A single failed field check, with a caller-facing message.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Largest accepted currency amount (seven integer digits).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

fn digits_of(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 10-digit mobile number; separators and spaces are stripped.
/// Empty input is treated as absent.
pub fn mobile(value: Option<&str>) -> ValidationResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => {
            let digits = digits_of(v);
            if digits.len() != 10 {
                return Err(ValidationError(
                    "mobile number must be exactly 10 digits".into(),
                ));
            }
            Ok(Some(digits))
        }
    }
}

/// 12-digit aadhaar number; separators and spaces are stripped.
pub fn aadhaar(value: Option<&str>) -> ValidationResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => {
            let digits = digits_of(v);
            if digits.len() != 12 {
                return Err(ValidationError(
                    "aadhaar number must be exactly 12 digits".into(),
                ));
            }
            Ok(Some(digits))
        }
    }
}

/// Zip codes are 2 to 6 digits.
pub fn zip(value: Option<&str>) -> ValidationResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.len() < 2 || trimmed.len() > 6 || !trimmed.chars().all(|c| c.is_ascii_digit())
            {
                return Err(ValidationError("zip code must be 2 to 6 digits".into()));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Calendar date in `YYYY-MM-DD` form.
pub fn date_ymd(value: &str, field: &str) -> ValidationResult<String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError(format!("{field} must be in YYYY-MM-DD format")))?;
    Ok(value.to_string())
}

/// Time of day. Accepts `HH:MM:SS` (24-hour, converted) or
/// `HH:MM:SS AM/PM` (kept as-is); always returns the 12-hour form.
pub fn time_of_day(value: &str, field: &str) -> ValidationResult<String> {
    if let Ok(parsed) = NaiveTime::parse_from_str(value, "%H:%M:%S") {
        return Ok(parsed.format("%I:%M:%S %p").to_string());
    }
    if NaiveTime::parse_from_str(value, "%I:%M:%S %p").is_ok() {
        return Ok(value.to_string());
    }
    Err(ValidationError(format!(
        "{field} must be in HH:MM:SS (24-hour) or HH:MM:SS AM/PM (12-hour) format"
    )))
}

/// UHID: exactly 8 digits (`YYMM` + 4-digit serial).
pub fn uhid(value: &str) -> ValidationResult<()> {
    if value.len() != 8 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError("UHID must be exactly 8 digits".into()));
    }
    Ok(())
}

/// Currency amount: non-negative, at most 9,999,999.99.
pub fn amount(value: Decimal, field: &str) -> ValidationResult<Decimal> {
    if value.is_sign_negative() {
        return Err(ValidationError(format!("{field} must not be negative")));
    }
    if value > MAX_AMOUNT {
        return Err(ValidationError(format!("{field} must not exceed 7 digits")));
    }
    Ok(value)
}

/// Required free-text field: non-empty after trimming.
pub fn required(value: &str, field: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Age in whole years, at most three digits.
pub fn age(value: Option<i64>) -> ValidationResult<Option<i64>> {
    match value {
        None => Ok(None),
        Some(v) if v < 0 => Err(ValidationError("age must not be negative".into())),
        Some(v) if v > 999 => Err(ValidationError("age must not exceed 3 digits".into())),
        Some(v) => Ok(Some(v)),
    }
}
