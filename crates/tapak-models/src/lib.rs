//! # Tapak Models
//!
//! Domain models and DTOs for the Tapak API.
//!
//! This crate provides the data structures used throughout the application:
//! database rows, request/response DTOs and their validation rules.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed entity ids
//! - [`auth`]: Login, refresh and identity payloads
//! - [`users`]: Users and the identity the auth middleware loads
//! - [`roles`]: Roles and permission grants
//! - [`projects`]: Projects
//! - [`moduls`]: Modules belonging to a project
//! - [`uploads`]: Resumable upload sessions and `Upload-Metadata` parsing
//!
//! # Example
//!
//! ```ignore
//! use tapak_models::projects::{CreateProjectDto, Project};
//! use validator::Validate;
//!
//! let dto = CreateProjectDto { name: "Portal".into(), description: None, status: None };
//! dto.validate()?;
//! ```

pub mod auth;
pub mod ids;
pub mod moduls;
pub mod projects;
pub mod roles;
pub mod uploads;
pub mod users;

// Re-export commonly used types at crate root for convenience
pub use auth::{LoginRequest, LoginResponse, MeResponse, RefreshTokenRequest, TokenResponse};
pub use ids::{ModulId, ProjectId, RoleId, UploadId, UserId};
pub use moduls::{CreateModulDto, Modul, UpdateModulDto};
pub use projects::{CreateProjectDto, Project, ProjectFilterParams, ProjectWithStats, UpdateProjectDto};
pub use roles::{GrantPermissionDto, RoleRecord, RoleWithPermissions};
pub use uploads::{Upload, UploadMetadata};
pub use users::{CreateUserDto, UpdateUserDto, User, UserFilterParams, UserIdentity};
