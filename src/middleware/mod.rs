//! Request pipeline middleware.
//!
//! Order for a protected route, outermost first:
//!
//! 1. [`request_id`]: assigns the correlation id
//! 2. access log, metrics, CORS, [`rate_limit`] and [`body_logging`]
//! 3. [`auth`]: resolves the caller into an `AuthContext`
//! 4. [`rbac`]: checks the route's `(Resource, Action)` against the caller's role
//! 5. [`tus`]: upload routes only, validates the resumable upload handshake
//!
//! Auth is attached per module with `route_layer`, RBAC per method route with
//! `require_permission!`, and TUS inside RBAC on each upload method route.

pub mod auth;
pub mod body_logging;
pub mod rate_limit;
pub mod rbac;
pub mod request_id;
pub mod tus;
