//! Uniform JSON envelope.
//!
//! Every response produced by the API uses one of two shapes that share the
//! same discriminant:
//!
//! ```json
//! { "status": "success", "message": "...", "code": 200, "data": {...}, "timestamp": "..." }
//! { "status": "error",   "message": "...", "code": 404, "errors": [...], "timestamp": "..." }
//! ```
//!
//! List endpoints add a `meta` block with [`PaginationMeta`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pagination::PaginationMeta;
use crate::validation::FieldError;

/// Envelope discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// RFC 3339 timestamp with an explicit offset, second precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: Status,
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn new(code: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
            code: code.as_u16(),
            data,
            meta: None,
            timestamp: timestamp(),
        }
    }

    /// 200 with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    /// 201 with a payload.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }

    /// 200 with a list payload and its pagination block.
    pub fn paginated(message: impl Into<String>, data: T, meta: PaginationMeta) -> Self {
        let mut response = Self::ok(message, data);
        response.meta = Some(meta);
        response
    }
}

impl ApiResponse<()> {
    /// 200 without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub status: Status,
    pub message: String,
    pub code: u16,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            code: code.as_u16(),
            errors: Vec::new(),
            timestamp: timestamp(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
