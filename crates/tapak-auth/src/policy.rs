//! Permission checking.
//!
//! The RBAC middleware asks a [`PermissionChecker`] whether a role may perform
//! an action on a resource. Decisions are never cached between calls.
//!
//! [`PolicyTable`] is the in-memory implementation. A database-backed store
//! lives next to the roles module.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use tapak_core::permissions::{Action, Permission, Resource, Role};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy store unavailable: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check(&self, role: Role, resource: Resource, action: Action) -> Result<bool, PolicyError>;
}

/// The grants shipped with a fresh installation.
pub fn default_grants() -> Vec<(Role, Permission)> {
    use Action::*;
    use Resource::*;

    let mut grants = Vec::new();

    for resource in Resource::ALL {
        for action in Action::ALL {
            grants.push((Role::Admin, Permission::new(resource, action)));
        }
    }

    for resource in [Projects, Moduls, Uploads] {
        for action in Action::ALL {
            grants.push((Role::Manager, Permission::new(resource, action)));
        }
    }
    grants.push((Role::Manager, Permission::new(Users, Read)));

    grants.push((Role::User, Permission::new(Projects, Read)));
    grants.push((Role::User, Permission::new(Moduls, Read)));
    for action in [Create, Read, Update, Delete] {
        grants.push((Role::User, Permission::new(Uploads, action)));
    }

    grants
}

/// In-memory set of `(role, resource, action)` grants.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    grants: BTreeSet<(Role, Permission)>,
}

impl PolicyTable {
    /// An empty table that denies everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        default_grants()
            .into_iter()
            .fold(Self::new(), |table, (role, permission)| {
                table.grant(role, permission.resource, permission.action)
            })
    }

    pub fn grant(mut self, role: Role, resource: Resource, action: Action) -> Self {
        self.grants.insert((role, Permission::new(resource, action)));
        self
    }

    pub fn revoke(mut self, role: Role, resource: Resource, action: Action) -> Self {
        self.grants.remove(&(role, Permission::new(resource, action)));
        self
    }

    pub fn allows(&self, role: Role, resource: Resource, action: Action) -> bool {
        self.grants.contains(&(role, Permission::new(resource, action)))
    }

    pub fn permissions_for(&self, role: Role) -> Vec<Permission> {
        self.grants
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, p)| *p)
            .collect()
    }
}

#[async_trait]
impl PermissionChecker for PolicyTable {
    async fn check(&self, role: Role, resource: Resource, action: Action) -> Result<bool, PolicyError> {
        Ok(self.allows(role, resource, action))
    }
}
