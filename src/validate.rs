// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Input validation and sanitization.
//!
//! Pure functions applied to untrusted payload fields before they reach
//! business logic or the store. Each failure names the field and the
//! constraint that was violated; numeric coordinates are rejected when out of
//! range, never clamped.

use serde_json::Value;

/// Field-scoped validation failure. The message is composed here and is safe
/// to cross the wire boundary as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid request body")]
    InvalidBody,

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("{field} must be a string")]
    NotAString { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} has invalid format")]
    InvalidFormat { field: &'static str },

    #[error("{field} must be a number")]
    NotANumber { field: &'static str },

    #[error("{field} must be an integer")]
    NotAnInteger { field: &'static str },

    #[error("{field} must be at least {min}")]
    BelowMinimum { field: &'static str, min: f64 },

    #[error("{field} must be at most {max}")]
    AboveMaximum { field: &'static str, max: f64 },
}

/// Constraints for [`validate_string`].
#[derive(Default)]
pub struct StringRules {
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    /// Format predicate; failure reads "<field> has invalid format".
    pub pattern: Option<fn(&str) -> bool>,
}

/// Constraints for [`validate_number`].
#[derive(Default)]
pub struct NumberRules {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub integer: bool,
}

/// Require that `body` is an object and that every named field is present
/// and non-null.
pub fn require_fields(body: &Value, fields: &[&str]) -> Result<(), ValidationError> {
    let Some(map) = body.as_object() else {
        return Err(ValidationError::InvalidBody);
    };
    for field in fields {
        match map.get(*field) {
            None | Some(Value::Null) => {
                return Err(ValidationError::MissingField((*field).to_string()))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Validate that `value` is a string satisfying `rules`, returning it owned.
pub fn validate_string(
    value: Option<&Value>,
    field: &'static str,
    rules: &StringRules,
) -> Result<String, ValidationError> {
    let Some(Value::String(s)) = value else {
        return Err(ValidationError::NotAString { field });
    };
    let len = s.chars().count();
    if let Some(min) = rules.min_len {
        if len < min {
            return Err(ValidationError::TooShort { field, min });
        }
    }
    if let Some(max) = rules.max_len {
        if len > max {
            return Err(ValidationError::TooLong { field, max });
        }
    }
    if let Some(pattern) = rules.pattern {
        if !pattern(s) {
            return Err(ValidationError::InvalidFormat { field });
        }
    }
    Ok(s.clone())
}

/// Validate that `value` is a number satisfying `rules`.
///
/// String values are coerced, so query parameters validate the same way as
/// JSON body fields.
pub fn validate_number(
    value: Option<&Value>,
    field: &'static str,
    rules: &NumberRules,
) -> Result<f64, ValidationError> {
    let num = match value {
        Some(Value::Number(n)) => n.as_f64().ok_or(ValidationError::NotANumber { field })?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::NotANumber { field })?,
        _ => return Err(ValidationError::NotANumber { field }),
    };
    if !num.is_finite() {
        return Err(ValidationError::NotANumber { field });
    }
    if rules.integer && num.fract() != 0.0 {
        return Err(ValidationError::NotAnInteger { field });
    }
    if let Some(min) = rules.min {
        if num < min {
            return Err(ValidationError::BelowMinimum { field, min });
        }
    }
    if let Some(max) = rules.max {
        if num > max {
            return Err(ValidationError::AboveMaximum { field, max });
        }
    }
    Ok(num)
}

/// Validate a latitude/longitude pair. Values outside the valid ranges are
/// rejected, not clamped.
pub fn validate_coordinates(
    lat: Option<&Value>,
    lng: Option<&Value>,
) -> Result<(f64, f64), ValidationError> {
    let lat = validate_number(
        lat,
        "latitude",
        &NumberRules {
            min: Some(-90.0),
            max: Some(90.0),
            ..Default::default()
        },
    )?;
    let lng = validate_number(
        lng,
        "longitude",
        &NumberRules {
            min: Some(-180.0),
            max: Some(180.0),
            ..Default::default()
        },
    )?;
    Ok((lat, lng))
}

/// Maximum length of any sanitized string.
const SANITIZED_MAX_CHARS: usize = 10_000;

/// Strip characters associated with injection risk, trim whitespace, and cap
/// the length deterministically.
pub fn sanitize_string(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"' | '`' | ';'))
        .take(SANITIZED_MAX_CHARS)
        .collect()
}
