//! Project models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use tapak_core::PaginationParams;
use tapak_core::serde::{deserialize_optional_i64, deserialize_optional_trimmed};
use tapak_core::validation::{one_of, required};

use crate::ids::{ProjectId, UserId};

pub const PROJECT_STATUSES: [&str; 3] = ["draft", "active", "archived"];
pub const DEFAULT_PROJECT_STATUS: &str = "draft";

fn validate_status(value: &str) -> Result<(), ValidationError> {
    one_of(value, &PROJECT_STATUSES)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project with the number of modules it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub project: Project,
    pub modul_count: i64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProjectDto {
    #[serde(default)]
    #[validate(custom(function = "required"), length(min = 3, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// One of `draft`, `active`, `archived`. Defaults to `draft`.
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectDto {
    #[validate(length(min = 3, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectFilterParams {
    /// Case-insensitive match on the project name
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub search: Option<String>,
    /// Exact status filter
    #[serde(default, deserialize_with = "deserialize_optional_trimmed")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl ProjectFilterParams {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.limit)
    }
}
