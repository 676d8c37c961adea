use std::collections::BTreeMap;

use anyhow::{Context, anyhow};
use sqlx::PgPool;
use tracing::instrument;

use tapak_core::{Action, AppError, Permission, Resource, Role};
use tapak_models::roles::RolePermissionRow;
use tapak_models::RoleWithPermissions;

pub struct RoleService;

impl RoleService {
    /// Every role with its grants, in [`Role::ALL`] order.
    #[instrument(skip(db))]
    pub async fn list_roles(db: &PgPool) -> Result<Vec<RoleWithPermissions>, AppError> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            "SELECT role, resource, action FROM role_permissions",
        )
        .fetch_all(db)
        .await
        .context("Failed to load role permissions")?;

        let mut grants: BTreeMap<Role, Vec<Permission>> = BTreeMap::new();
        for row in rows {
            let parsed = (
                row.role.parse::<Role>(),
                row.resource.parse::<Resource>(),
                row.action.parse::<Action>(),
            );
            match parsed {
                (Ok(role), Ok(resource), Ok(action)) => grants
                    .entry(role)
                    .or_default()
                    .push(Permission::new(resource, action)),
                _ => tracing::warn!(
                    role = %row.role,
                    resource = %row.resource,
                    action = %row.action,
                    "Skipping unrecognised grant"
                ),
            }
        }

        Ok(Role::ALL
            .into_iter()
            .map(|role| RoleWithPermissions::new(role, grants.remove(&role).unwrap_or_default()))
            .collect())
    }

    #[instrument(skip(db))]
    pub async fn get_role(db: &PgPool, role: Role) -> Result<RoleWithPermissions, AppError> {
        let rows = sqlx::query_as::<_, RolePermissionRow>(
            "SELECT role, resource, action FROM role_permissions WHERE role = $1",
        )
        .bind(role.as_str())
        .fetch_all(db)
        .await
        .context("Failed to load role permissions")?;

        let permissions = rows
            .iter()
            .filter_map(|row| {
                Some(Permission::new(row.resource.parse().ok()?, row.action.parse().ok()?))
            })
            .collect();

        Ok(RoleWithPermissions::new(role, permissions))
    }

    /// Granting an existing permission is a no-op.
    #[instrument(skip(db))]
    pub async fn grant(
        db: &PgPool,
        role: Role,
        permission: Permission,
    ) -> Result<RoleWithPermissions, AppError> {
        sqlx::query(
            r#"INSERT INTO role_permissions (role, resource, action)
               VALUES ($1, $2, $3)
               ON CONFLICT (role, resource, action) DO NOTHING"#,
        )
        .bind(role.as_str())
        .bind(permission.resource.as_str())
        .bind(permission.action.as_str())
        .execute(db)
        .await
        .context("Failed to grant permission")?;

        crate::audit_event!("grant", "roles", role = %role, permission = %permission, "Permission granted");
        Self::get_role(db, role).await
    }

    #[instrument(skip(db))]
    pub async fn revoke(
        db: &PgPool,
        role: Role,
        permission: Permission,
    ) -> Result<RoleWithPermissions, AppError> {
        let result = sqlx::query(
            "DELETE FROM role_permissions WHERE role = $1 AND resource = $2 AND action = $3",
        )
        .bind(role.as_str())
        .bind(permission.resource.as_str())
        .bind(permission.action.as_str())
        .execute(db)
        .await
        .context("Failed to revoke permission")?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!(
                "Role {role} does not have permission {permission}"
            )));
        }

        crate::audit_event!("revoke", "roles", role = %role, permission = %permission, "Permission revoked");
        Self::get_role(db, role).await
    }
}
