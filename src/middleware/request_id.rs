//! Correlation ids.
//!
//! Every request gets exactly one id. A non-empty `X-Request-ID` from the
//! client is kept as is; otherwise a UUID v4 is generated. The id is stored
//! in the request extensions as a [`RequestId`] and echoed on the response.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request},
    http::{Extensions, HeaderName, HeaderValue, request::Parts},
    middleware::Next,
    response::Response,
};
use tower_http::request_id::RequestId;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

fn generate() -> HeaderValue {
    // A hyphenated UUID is always a valid header value.
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("invalid-request-id"))
}

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = match req.headers().get(&REQUEST_ID_HEADER) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => generate(),
    };

    req.headers_mut().insert(REQUEST_ID_HEADER, id.clone());
    req.extensions_mut().insert(RequestId::new(id.clone()));

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, id);
    response
}

/// The correlation id stored by [`request_id_middleware`], if it ran.
pub fn request_id_of(extensions: &Extensions) -> Option<String> {
    extensions
        .get::<RequestId>()
        .map(|id| String::from_utf8_lossy(id.header_value().as_bytes()).into_owned())
}

/// Extractor for the current correlation id. Empty when the request id
/// middleware is not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(pub String);

impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CorrelationId(
            request_id_of(&parts.extensions).unwrap_or_default(),
        ))
    }
}
