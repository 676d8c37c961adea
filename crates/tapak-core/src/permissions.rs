//! RBAC vocabulary for the Tapak API.
//!
//! Roles, resources and actions are closed enums; a [`Permission`] is a
//! `(Resource, Action)` pair rendered as `"resource:action"`.
//!
//! Role names coming from the database are parsed with [`str::parse`]. A name
//! that does not parse is treated by the RBAC gate exactly like a missing role.
//!
//! # Example
//!
//! ```ignore
//! use tapak_core::permissions::{Action, Permission, Resource, Role};
//!
//! let role: Role = "manager".parse()?;
//! let permission = Permission::new(Resource::Projects, Action::Delete);
//! assert_eq!(permission.to_string(), "projects:delete");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseVocabularyError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseVocabularyError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Manager, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Projects,
    Moduls,
    Users,
    Roles,
    Uploads,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Projects,
        Resource::Moduls,
        Resource::Users,
        Resource::Roles,
        Resource::Uploads,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Projects => "projects",
            Resource::Moduls => "moduls",
            Resource::Users => "users",
            Resource::Roles => "roles",
            Resource::Uploads => "uploads",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

macro_rules! impl_vocabulary {
    ($ty:ident, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseVocabularyError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::ALL
                    .into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| ParseVocabularyError::new($kind, s))
            }
        }
    };
}

impl_vocabulary!(Role, "role");
impl_vocabulary!(Resource, "resource");
impl_vocabulary!(Action, "action");

/// A `(Resource, Action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for Permission {
    type Err = ParseVocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource, action) = s
            .split_once(':')
            .ok_or_else(|| ParseVocabularyError::new("permission", s))?;
        Ok(Permission::new(resource.parse()?, action.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_is_case_sensitive() {
        assert!("Admin".parse::<Role>().is_err());
        assert!("superuser".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_parse_error_message() {
        let err = "widgets".parse::<Resource>().unwrap_err();
        assert_eq!(err.to_string(), "unknown resource 'widgets'");
    }

    #[test]
    fn test_permission_display() {
        let permission = Permission::new(Resource::Projects, Action::Read);
        assert_eq!(permission.to_string(), "projects:read");
    }

    #[test]
    fn test_permission_parse() {
        let permission: Permission = "uploads:delete".parse().unwrap();
        assert_eq!(permission, Permission::new(Resource::Uploads, Action::Delete));
        assert!("uploads".parse::<Permission>().is_err());
        assert!("uploads:destroy".parse::<Permission>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), r#""manager""#);
        let action: Action = serde_json::from_str(r#""update""#).unwrap();
        assert_eq!(action, Action::Update);
    }
}
