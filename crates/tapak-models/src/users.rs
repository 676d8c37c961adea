//! User models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use tapak_core::serde::{deserialize_optional_i64, deserialize_optional_trimmed};
use tapak_core::validation::{one_of, required};
use tapak_core::{PaginationParams, Role};

use crate::ids::UserId;

/// A user as returned by the API. The password hash is never selected into
/// this row.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Role name, `None` when the user has no role.
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the auth middleware needs to know about the caller.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserIdentity {
    pub id: UserId,
    pub email: String,
    pub role: Option<String>,
    pub is_active: bool,
}

/// Login lookup row, including the password hash.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: UserId,
    pub password: String,
    pub is_active: bool,
}

pub(crate) fn validate_role(value: &str) -> Result<(), ValidationError> {
    let names: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
    one_of(value, &names)
}

#[derive(Deserialize, Debug, Clone, Validate, ToSchema)]
pub struct CreateUserDto {
    #[serde(default)]
    #[validate(custom(function = "required"), length(max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "required"), email)]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "required"), length(min = 8, max = 72))]
    pub password: String,
    /// Role name (`admin`, `manager`, `user`). Defaults to `user`.
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserFilterParams {
    /// Case-insensitive match on name or email
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl UserFilterParams {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}
