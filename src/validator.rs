//! JSON body extraction with validation.
//!
//! [`ValidatedJson`] deserializes the body and runs the `validator` rules of
//! the target type. Every failure is a 400; validation failures carry the
//! humanised field list in the envelope's `errors`.

use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use std::str::FromStr;
use validator::Validate;

use tapak_core::AppError;
use tapak_core::validation::{FieldError, VALIDATION_FAILED, humanize};

fn missing_field(message: &str) -> Option<&str> {
    message
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
        .filter(|field| !field.is_empty())
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::bad_request(anyhow!(
            "Missing 'Content-Type: application/json' header"
        ));
    }

    let message = rejection.body_text();

    if let Some(field) = missing_field(&message) {
        return AppError::bad_request(anyhow!(VALIDATION_FAILED))
            .with_details(vec![FieldError::required(field)]);
    }

    if message.contains("invalid type") {
        return AppError::bad_request(anyhow!("Invalid field type in request"));
    }

    AppError::bad_request(anyhow!("Invalid request body"))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value.validate().map_err(|errors| {
            AppError::bad_request(anyhow!(VALIDATION_FAILED)).with_details(humanize(&errors))
        })?;

        Ok(ValidatedJson(value))
    }
}

/// Parses a path segment into a typed id, answering 400 in the envelope
/// instead of axum's plain-text path rejection.
pub fn parse_id<T: FromStr>(raw: &str, entity: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request(anyhow!("Invalid {entity} id")))
}
