//! Redaction of sensitive fields in request bodies before they are logged.
//!
//! JSON bodies are parsed and walked as a [`Value`] tree; the value of every
//! object key that names a secret is replaced with [`REDACTED`], at any depth.
//! Bodies that are not JSON are never logged verbatim.

use serde_json::Value;

pub const REDACTED: &str = "[REDACTED]";

/// Object keys (compared case-insensitively) whose values are never logged.
pub const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "password_confirmation",
    "confirm_password",
    "old_password",
    "new_password",
    "token",
    "access_token",
    "refresh_token",
    "secret",
    "authorization",
];

pub fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Redacts sensitive keys in place.
pub fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, v) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *v = Value::String(REDACTED.to_string());
                } else {
                    redact_value(v);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_value),
        _ => {}
    }
}

/// Renders a request body for logging.
///
/// JSON is re-serialised after redaction; anything else becomes a length
/// placeholder.
pub fn redact_body(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut value) => {
            redact_value(&mut value);
            value.to_string()
        }
        Err(_) => format!("<non-JSON body: {} bytes>", bytes.len()),
    }
}
