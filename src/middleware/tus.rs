//! Resumable upload protocol handshake.
//!
//! Only headers are inspected, never the body:
//!
//! - `OPTIONS` is answered here with `204` and the capability headers.
//! - Any other method that is not `GET` or `POST` must send `Tus-Resumable`.
//! - A `Tus-Resumable` value that is not exactly the configured version is
//!   rejected, whatever the method.
//!
//! Rejections are `412` and carry the server's version so the client can
//! correct itself. Responses that pass through get `Tus-Resumable` stamped.

use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use tapak_config::TusConfig;
use tapak_config::tus::TUS_EXTENSIONS;
use tapak_core::AppError;

pub const TUS_RESUMABLE: HeaderName = HeaderName::from_static("tus-resumable");
pub const TUS_VERSION: HeaderName = HeaderName::from_static("tus-version");
pub const TUS_EXTENSION: HeaderName = HeaderName::from_static("tus-extension");
pub const TUS_MAX_SIZE: HeaderName = HeaderName::from_static("tus-max-size");
pub const UPLOAD_OFFSET: HeaderName = HeaderName::from_static("upload-offset");
pub const UPLOAD_LENGTH: HeaderName = HeaderName::from_static("upload-length");
pub const UPLOAD_METADATA: HeaderName = HeaderName::from_static("upload-metadata");

pub const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "Configured TUS header value is not a valid header"),
    }
}

fn stamp_version(headers: &mut HeaderMap, config: &TusConfig) {
    insert(headers, TUS_RESUMABLE, &config.version);
}

/// `204` with `Tus-Resumable`, `Tus-Version`, `Tus-Extension` and `Tus-Max-Size`.
pub fn capabilities(config: &TusConfig) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    stamp_version(headers, config);
    insert(headers, TUS_VERSION, &config.version);
    headers.insert(TUS_EXTENSION, HeaderValue::from_static(TUS_EXTENSIONS));
    headers.insert(TUS_MAX_SIZE, HeaderValue::from(config.max_size));
    response
}

fn precondition_failed(config: &TusConfig, message: &'static str) -> Response {
    crate::security_event!(
        "tus.precondition_failed",
        required_version = %config.version,
        "{}",
        message
    );
    let mut response = AppError::precondition_failed(anyhow!(message)).into_response();
    let headers = response.headers_mut();
    stamp_version(headers, config);
    insert(headers, TUS_VERSION, &config.version);
    response
}

pub async fn tus_protocol(State(config): State<TusConfig>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    if method == Method::OPTIONS {
        return capabilities(&config);
    }

    match req.headers().get(&TUS_RESUMABLE) {
        None if method != Method::GET && method != Method::POST => {
            return precondition_failed(&config, "Tus-Resumable header is required");
        }
        Some(declared) if declared.as_bytes() != config.version.as_bytes() => {
            return precondition_failed(&config, "Unsupported Tus-Resumable version");
        }
        _ => {}
    }

    let mut response = next.run(req).await;
    stamp_version(response.headers_mut(), &config);
    response
}
