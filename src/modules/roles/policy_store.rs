//! Database-backed [`PermissionChecker`].
//!
//! Every decision is a fresh query against `role_permissions`, so grants and
//! revocations apply to the very next request.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::Instrument;

use tapak_auth::{PermissionChecker, PolicyError};
use tapak_core::{Action, Resource, Role};

#[derive(Clone, Debug)]
pub struct PgPolicyStore {
    db: PgPool,
}

impl PgPolicyStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PermissionChecker for PgPolicyStore {
    async fn check(&self, role: Role, resource: Resource, action: Action) -> Result<bool, PolicyError> {
        sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(
                   SELECT 1 FROM role_permissions
                   WHERE role = $1 AND resource = $2 AND action = $3
               )"#,
        )
        .bind(role.as_str())
        .bind(resource.as_str())
        .bind(action.as_str())
        .fetch_one(&self.db)
        .instrument(crate::db_operation_span!("SELECT", "role_permissions"))
        .await
        .map_err(|e| PolicyError::Store(Box::new(e)))
    }
}
