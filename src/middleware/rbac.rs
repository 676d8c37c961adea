//! Role-based access control.
//!
//! Each protected route is registered with a fixed `(Resource, Action)`
//! pair. The gate reads the caller's role from the [`AuthContext`] placed by
//! the auth middleware and asks the [`PermissionChecker`]. Anything other
//! than an explicit "yes" stops the request:
//!
//! | situation                              | response |
//! |----------------------------------------|----------|
//! | no auth context, empty or unknown role | 403      |
//! | checker returned an error              | 500      |
//! | checker returned `false`               | 403      |
//! | checker returned `true`                | handler  |
//!
//! ```ignore
//! Router::new().route(
//!     "/",
//!     get(list_projects)
//!         .route_layer(require_permission!(state.permissions.clone(), Resource::Projects, Action::Read)),
//! )
//! ```

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use tapak_auth::PermissionChecker;
use tapak_core::{Action, AppError, Resource, Role};

use crate::metrics::track_rbac_decision;
use crate::middleware::auth::AuthContext;

pub const FORBIDDEN_MESSAGE: &str = "Forbidden";

#[derive(Clone)]
pub struct RbacGate {
    checker: Arc<dyn PermissionChecker>,
    resource: Resource,
    action: Action,
}

impl RbacGate {
    pub fn new(checker: Arc<dyn PermissionChecker>, resource: Resource, action: Action) -> Self {
        Self {
            checker,
            resource,
            action,
        }
    }

    fn deny(&self, role: &str, reason: &'static str) -> AppError {
        track_rbac_decision("denied");
        crate::security_event!(
            "rbac.denied",
            role = role,
            resource = %self.resource,
            action = %self.action,
            reason = reason,
            "Permission denied"
        );
        AppError::forbidden(anyhow!(FORBIDDEN_MESSAGE))
    }

    /// Decides whether the caller described by `context` may proceed.
    pub async fn decide(&self, context: Option<&AuthContext>) -> Result<(), AppError> {
        let role_name = context.map(|c| c.role.as_str()).unwrap_or_default();
        if role_name.is_empty() {
            return Err(self.deny(role_name, "missing_role"));
        }

        let Ok(role) = role_name.parse::<Role>() else {
            return Err(self.deny(role_name, "unknown_role"));
        };

        match self.checker.check(role, self.resource, self.action).await {
            Ok(true) => {
                track_rbac_decision("allowed");
                Ok(())
            }
            Ok(false) => Err(self.deny(role_name, "not_granted")),
            Err(e) => {
                track_rbac_decision("error");
                Err(AppError::internal(anyhow!(
                    "permission check for {}:{} failed: {}",
                    self.resource,
                    self.action,
                    e
                )))
            }
        }
    }
}

pub async fn authorize(
    State(gate): State<RbacGate>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    gate.decide(req.extensions().get::<AuthContext>()).await?;
    Ok(next.run(req).await)
}

/// Builds the route layer that guards a handler with `(resource, action)`.
#[macro_export]
macro_rules! require_permission {
    ($checker:expr, $resource:expr, $action:expr) => {
        axum::middleware::from_fn_with_state(
            $crate::middleware::rbac::RbacGate::new($checker, $resource, $action),
            $crate::middleware::rbac::authorize,
        )
    };
}
