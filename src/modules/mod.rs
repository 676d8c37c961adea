//! Feature modules.
//!
//! Each module follows the same layout: `controller.rs` (HTTP handlers with
//! their OpenAPI annotations), `service.rs` (queries and business rules) and
//! `router.rs` (routes with their auth and RBAC layers).

pub mod auth;
pub mod health;
pub mod moduls;
pub mod projects;
pub mod roles;
pub mod uploads;
pub mod users;
