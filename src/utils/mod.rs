//! Shared utilities for the Tapak API.
//!
//! - [`tracing`]: span helpers plus the `db_operation_span!`, `auth_span!`,
//!   `security_event!` and `audit_event!` macros

pub mod tracing;
