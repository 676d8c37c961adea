//! Tracing utilities and helper macros for observability
//!
//! Spans and events emitted through these helpers share field names, so the
//! JSON log file and the OTLP exporter can be queried the same way.

use tracing::Span;

/// Create a span for database operations with semantic conventions
///
/// # Example
/// ```ignore
/// let span = db_operation_span!("UPDATE", "uploads", upload.id = %id);
/// async {
///     // database operation
/// }.instrument(span).await;
/// ```
#[macro_export]
macro_rules! db_operation_span {
    ($operation:expr, $table:expr) => {
        tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = $operation,
            db.sql.table = $table,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty
        )
    };
    ($operation:expr, $table:expr, $($field:tt)*) => {
        tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = $operation,
            db.sql.table = $table,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty,
            $($field)*
        )
    };
}

/// Create a span for authentication/authorization operations
///
/// # Example
/// ```ignore
/// let span = auth_span!("login", user.email = %email);
/// ```
#[macro_export]
macro_rules! auth_span {
    ($event:expr) => {
        tracing::info_span!(
            "auth",
            auth.event = $event,
            auth.success = tracing::field::Empty,
            user.id = tracing::field::Empty,
            otel.kind = "internal"
        )
    };
    ($event:expr, $($field:tt)*) => {
        tracing::info_span!(
            "auth",
            auth.event = $event,
            auth.success = tracing::field::Empty,
            user.id = tracing::field::Empty,
            otel.kind = "internal",
            $($field)*
        )
    };
}

/// Log a security-relevant event at WARN level
///
/// Use this for failed authentication, authorization denials and protocol
/// violations.
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {
        tracing::warn!(
            security.event = $event,
            $($field)*
        )
    };
}

/// Log an audit event at INFO level
///
/// Use this for resource mutations: user creation, permission grants,
/// project deletion and so on.
#[macro_export]
macro_rules! audit_event {
    ($action:expr, $resource:expr, $($field:tt)*) => {
        tracing::info!(
            audit.action = $action,
            audit.resource = $resource,
            $($field)*
        )
    };
}

/// Record a successful operation on the current span
pub fn record_success() {
    Span::current().record("otel.status_code", "OK");
}

/// Record a failed operation on the current span with an error message
pub fn record_error(message: &str) {
    let span = Span::current();
    span.record("otel.status_code", "ERROR");
    span.record("error.message", message);
}

/// Record a user ID on the current span
pub fn record_user_id(user_id: &str) {
    Span::current().record("user.id", user_id);
}

/// Record authentication success/failure on the current span
pub fn record_auth_result(success: bool) {
    Span::current().record("auth.success", success);
}
