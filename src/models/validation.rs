use std::fmt;

use serde::Serialize;

/// One rejected field and the reason it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every violation found while validating a single payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[cfg(test)]
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected violations.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.violations.iter().map(|v| v.message.as_str()).collect();
        write!(f, "Validation failed: {}", messages.join(", "))
    }
}

impl std::error::Error for ValidationError {}

// ── Field rules ───────────────────────────────────────────────────────────────

pub(crate) fn required_text(
    errors: &mut ValidationError,
    field: &'static str,
    value: Option<String>,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(field, format!("{} is required", field));
            None
        }
    }
}

pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

pub(crate) fn non_negative_number(
    errors: &mut ValidationError,
    field: &'static str,
    value: f64,
) -> Option<f64> {
    if !value.is_finite() {
        errors.push(field, format!("{} must be a finite number", field));
        None
    } else if value < 0.0 {
        errors.push(field, format!("{} must be greater than or equal to 0", field));
        None
    } else {
        Some(value)
    }
}

/// JSON numbers arrive as `f64`; integral values are accepted even when
/// written as `5.0`.
pub(crate) fn non_negative_integer(
    errors: &mut ValidationError,
    field: &'static str,
    value: f64,
) -> Option<i64> {
    let value = non_negative_number(errors, field, value)?;
    if value.fract() != 0.0 {
        errors.push(field, format!("{} must be an integer", field));
        return None;
    }
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range
    if value >= i64::MAX as f64 {
        errors.push(field, format!("{} is too large", field));
        return None;
    }
    Some(value as i64)
}
