//! Field-level validation messages.
//!
//! [`humanize`] turns `validator` errors into a sorted list of
//! `(field, message)` pairs with Indonesian messages. Each validator code maps
//! to one fixed template; codes without a template fall back to
//! `"{field} tidak valid"`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{ValidationError, ValidationErrors};

/// Message used for the envelope of every validation failure.
pub const VALIDATION_FAILED: &str = "Validasi gagal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The message produced for a missing required field.
    pub fn required(field: &str) -> Self {
        Self::new(field, format!("{field} wajib diisi"))
    }
}

/// Converts validation errors into humanised field errors, sorted by field
/// then message.
///
/// A field that failed `required` reports only that failure.
pub fn humanize(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            let missing = errs.iter().any(|e| e.code == "required");
            errs.iter()
                .filter(move |err| !missing || err.code == "required")
                .map(move |err| FieldError::new(field.to_string(), message_for(field, err)))
        })
        .collect();

    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

fn message_for(field: &str, err: &ValidationError) -> String {
    match err.code.as_ref() {
        "required" => format!("{field} wajib diisi"),
        "length" => length_message(field, err),
        "range" => range_message(field, err),
        "email" => format!("{field} harus berupa email yang valid"),
        "url" => format!("{field} harus berupa URL yang valid"),
        "contains" => format!("{field} harus mengandung '{}'", pattern_param(err)),
        "does_not_contain" => format!("{field} tidak boleh mengandung '{}'", pattern_param(err)),
        "must_match" => format!("{field} harus sama dengan {}", param_text(err, "other")),
        "regex" => format!("{field} formatnya tidak valid"),
        "one_of" => format!("{field} harus salah satu dari: {}", param_text(err, "values")),
        _ => format!("{field} tidak valid"),
    }
}

fn length_message(field: &str, err: &ValidationError) -> String {
    if let Some(equal) = param_i64(err, "equal") {
        return format!("{field} harus {equal} karakter");
    }

    let min = param_i64(err, "min");
    let max = param_i64(err, "max");
    let actual = err
        .params
        .get("value")
        .and_then(Value::as_str)
        .map(|s| s.chars().count() as i64);

    match (min, max, actual) {
        (Some(min), _, Some(len)) if len < min => format!("{field} minimal {min} karakter"),
        (_, Some(max), Some(len)) if len > max => format!("{field} maksimal {max} karakter"),
        (Some(min), None, _) => format!("{field} minimal {min} karakter"),
        (None, Some(max), _) => format!("{field} maksimal {max} karakter"),
        (Some(min), Some(_), None) => format!("{field} minimal {min} karakter"),
        _ => format!("{field} tidak valid"),
    }
}

fn range_message(field: &str, err: &ValidationError) -> String {
    let min = err.params.get("min").and_then(Value::as_f64);
    let max = err.params.get("max").and_then(Value::as_f64);
    let actual = err.params.get("value").and_then(Value::as_f64);

    match (min, max, actual) {
        (Some(min), _, Some(v)) if v < min => {
            format!("{field} minimal bernilai {}", param_text(err, "min"))
        }
        (_, Some(max), Some(v)) if v > max => {
            format!("{field} maksimal bernilai {}", param_text(err, "max"))
        }
        (Some(_), None, _) => format!("{field} minimal bernilai {}", param_text(err, "min")),
        (None, Some(_), _) => format!("{field} maksimal bernilai {}", param_text(err, "max")),
        _ => format!("{field} tidak valid"),
    }
}

fn param_i64(err: &ValidationError, key: &str) -> Option<i64> {
    err.params.get(key).and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_u64().and_then(|n| i64::try_from(n).ok()))
    })
}

/// Renders a parameter without JSON quoting; integral floats lose their `.0`.
fn param_text(err: &ValidationError, key: &str) -> String {
    match err.params.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn pattern_param(err: &ValidationError) -> String {
    if err.params.contains_key("needle") {
        param_text(err, "needle")
    } else {
        param_text(err, "pattern")
    }
}

/// Presence check producing a `required` error for empty or blank strings.
///
/// Request DTOs default absent string fields to `""` so a missing field and an
/// empty one report the same message.
pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Set-membership check producing a `one_of` error.
///
/// Used from `#[validate(custom(function = ...))]` wrappers in DTO modules.
pub fn one_of(value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }

    let mut err = ValidationError::new("one_of");
    err.add_param(Cow::from("values"), &allowed.join(", "));
    err.add_param(Cow::from("value"), &value);
    Err(err)
}

/// Equality check against another field producing a `must_match` error that
/// names the other field (never its value).
pub fn must_match(value: &str, other_value: &str, other_field: &str) -> Result<(), ValidationError> {
    if value == other_value {
        return Ok(());
    }

    let mut err = ValidationError::new("must_match");
    err.add_param(Cow::from("other"), &other_field);
    Err(err)
}
