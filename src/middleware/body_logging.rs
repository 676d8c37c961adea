//! Debug-level request body logging with structured redaction.
//!
//! Bodies are only buffered when debug logging is on, the declared
//! `Content-Length` is small enough and the request is not an upload chunk.
//! Sensitive JSON fields are replaced before anything is written to the log.

use anyhow::anyhow;
use axum::{
    body::{Body, to_bytes},
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::Level;

use tapak_core::AppError;
use tapak_core::redact::redact_body;

use crate::middleware::request_id::request_id_of;
use crate::middleware::tus::OFFSET_OCTET_STREAM;

pub const MAX_LOGGED_BODY: usize = 64 * 1024;

/// Whether the body of `req` may be buffered for logging.
pub fn should_buffer(req: &Request) -> bool {
    let is_upload_chunk = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(OFFSET_OCTET_STREAM));
    if is_upload_chunk {
        return false;
    }

    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .is_some_and(|len| len > 0 && len <= MAX_LOGGED_BODY)
}

/// Reads the body, logs its redacted form and hands back an equivalent request.
pub async fn log_body(req: Request) -> Result<Request, AppError> {
    let request_id = request_id_of(req.extensions()).unwrap_or_default();
    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_LOGGED_BODY)
        .await
        .map_err(|e| AppError::bad_request(anyhow!("Failed to read request body: {}", e)))?;

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %parts.uri.path(),
        body = %redact_body(&bytes),
        "Request body"
    );

    Ok(Request::from_parts(parts, Body::from(bytes)))
}

pub async fn body_logging_middleware(req: Request, next: Next) -> Result<Response, AppError> {
    if !tracing::enabled!(Level::DEBUG) || !should_buffer(&req) {
        return Ok(next.run(req).await);
    }

    let req = log_body(req).await?;
    Ok(next.run(req).await)
}
