//! # Tapak CLI
//!
//! Administrative operations that must not be reachable over HTTP: creating
//! the first admin account and editing the role permission table.
//!
//! ```ignore
//! use tapak_cli::admin::{create_admin, grant};
//! use tapak_core::{Action, Resource, Role};
//!
//! create_admin(&pool, "Admin", "admin@example.com", "s3cret-pass").await?;
//! grant(&pool, Role::Manager, Resource::Users, Action::Update).await?;
//! ```

pub mod admin;

pub use admin::{CliError, create_admin, grant, revoke};
