//! Role and permission grant models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use tapak_core::permissions::{Action, Permission, Resource, Role};
use tapak_core::validation::one_of;

use crate::ids::RoleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A role with the permissions currently granted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoleWithPermissions {
    pub role: Role,
    /// Rendered as `resource:action`
    pub permissions: Vec<String>,
}

impl RoleWithPermissions {
    pub fn new(role: Role, mut permissions: Vec<Permission>) -> Self {
        permissions.sort();
        Self {
            role,
            permissions: permissions.iter().map(ToString::to_string).collect(),
        }
    }
}

/// A row of the `role_permissions` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RolePermissionRow {
    pub role: String,
    pub resource: String,
    pub action: String,
}

fn validate_resource(value: &str) -> Result<(), ValidationError> {
    let names: Vec<&str> = Resource::ALL.iter().map(|r| r.as_str()).collect();
    one_of(value, &names)
}

fn validate_action(value: &str) -> Result<(), ValidationError> {
    let names: Vec<&str> = Action::ALL.iter().map(|a| a.as_str()).collect();
    one_of(value, &names)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GrantPermissionDto {
    #[serde(default)]
    #[validate(custom(function = "validate_resource"))]
    pub resource: String,
    #[serde(default)]
    #[validate(custom(function = "validate_action"))]
    pub action: String,
}

impl GrantPermissionDto {
    /// The typed permission. Only meaningful after validation succeeded.
    pub fn permission(&self) -> Option<Permission> {
        Some(Permission::new(
            self.resource.parse().ok()?,
            self.action.parse().ok()?,
        ))
    }
}
