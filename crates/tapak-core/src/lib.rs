//! # Tapak Core
//!
//! Core types, errors, and utilities for the Tapak API.
//!
//! This crate provides foundational types used throughout the Tapak application:
//!
//! - [`errors`]: Application error taxonomy with HTTP response conversion
//! - [`response`]: The uniform JSON envelope used by every endpoint
//! - [`pagination`]: Page/limit normalisation and pagination metadata
//! - [`validation`]: Humanised (Indonesian) validation messages
//! - [`redact`]: Structured redaction of sensitive fields in logged bodies
//! - [`permissions`]: RBAC vocabulary (roles, resources, actions)
//! - [`password`]: Password hashing and verification
//! - [`serde`]: Custom serde deserialization helpers
//!
//! # Example
//!
//! ```ignore
//! use tapak_core::{ApiResponse, AppError};
//! use tapak_core::pagination::calculate_pagination;
//!
//! let meta = calculate_pagination(1, 20, 95);
//! let body = ApiResponse::paginated("Daftar project", projects, meta);
//!
//! let err = AppError::not_found(anyhow::anyhow!("Project not found"));
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod permissions;
pub mod redact;
pub mod response;
pub mod serde;
pub mod validation;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_dummy_password, verify_password};
pub use permissions::{Action, Permission, Resource, Role};
pub use response::{ApiResponse, ErrorResponse, Status};
pub use validation::FieldError;
