use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use tapak_core::{Action, Resource, Role, hash_password};

/// Minimum password length accepted for admin accounts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to hash password")]
    Password,
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    #[error("a user with email '{0}' already exists")]
    EmailTaken(String),
    #[error("role '{0}' is missing from the roles table; run the migrations first")]
    RoleMissing(String),
}

/// Creates an active user holding the `admin` role and returns its id.
pub async fn create_admin(
    pool: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Uuid, CliError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CliError::PasswordTooShort);
    }

    let hashed = hash_password(password).map_err(|_| CliError::Password)?;

    let role_id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM roles WHERE name = $1")
        .bind(Role::Admin.as_str())
        .fetch_optional(pool)
        .await?;
    let role_id = role_id.ok_or_else(|| CliError::RoleMissing(Role::Admin.to_string()))?;

    let id: Option<Uuid> = sqlx::query_scalar(
        "INSERT INTO users (name, email, password, role_id, is_active)
         VALUES ($1, $2, $3, $4, TRUE)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(hashed)
    .bind(role_id)
    .fetch_optional(pool)
    .await?;

    id.ok_or_else(|| CliError::EmailTaken(email.to_string()))
}

/// Grants `resource:action` to `role`. Returns `false` when the grant already
/// existed.
pub async fn grant(
    pool: &PgPool,
    role: Role,
    resource: Resource,
    action: Action,
) -> Result<bool, CliError> {
    let result = sqlx::query(
        "INSERT INTO role_permissions (role, resource, action)
         VALUES ($1, $2, $3)
         ON CONFLICT (role, resource, action) DO NOTHING",
    )
    .bind(role.as_str())
    .bind(resource.as_str())
    .bind(action.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Revokes `resource:action` from `role`. Returns `false` when there was
/// nothing to revoke.
pub async fn revoke(
    pool: &PgPool,
    role: Role,
    resource: Resource,
    action: Action,
) -> Result<bool, CliError> {
    let result = sqlx::query(
        "DELETE FROM role_permissions WHERE role = $1 AND resource = $2 AND action = $3",
    )
    .bind(role.as_str())
    .bind(resource.as_str())
    .bind(action.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
