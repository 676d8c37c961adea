use anyhow::{Context, anyhow};
use sqlx::PgPool;
use tracing::instrument;

use tapak_core::pagination::calculate_pagination;
use tapak_core::{AppError, PaginationMeta, Role, hash_password};
use tapak_models::users::UserCredentials;
use tapak_models::{CreateUserDto, UpdateUserDto, User, UserFilterParams, UserId};

/// Columns of [`User`] selected from `users u LEFT JOIN roles r`.
pub(crate) const USER_COLUMNS: &str =
    "u.id, u.name, u.email, r.name AS role, u.is_active, u.created_at, u.updated_at";

fn map_unique_email(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::conflict(anyhow!("A user with this email already exists"));
    }
    AppError::from(e)
}

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn get_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<(Vec<User>, PaginationMeta), AppError> {
        let pagination = filters.pagination();
        let (page, limit) = pagination.normalized();
        let search = filters.search.map(|s| format!("%{s}%"));

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM users u
               WHERE ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)"#,
        )
        .bind(&search)
        .fetch_one(db)
        .await
        .context("Failed to count users")?;

        let users = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS}
               FROM users u
               LEFT JOIN roles r ON r.id = u.role_id
               WHERE ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
               ORDER BY u.created_at DESC, u.id
               LIMIT $2 OFFSET $3"#
        ))
        .bind(&search)
        .bind(limit)
        .bind(pagination.offset())
        .fetch_all(db)
        .await
        .context("Failed to fetch users")?;

        Ok((users, calculate_pagination(page, limit, total)))
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS}
               FROM users u
               LEFT JOIN roles r ON r.id = u.role_id
               WHERE u.id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch user")?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db, dto), fields(email = %dto.email))]
    pub async fn create_user(db: &PgPool, dto: CreateUserDto) -> Result<User, AppError> {
        let password = hash_password(&dto.password)?;
        let role = dto.role.unwrap_or_else(|| Role::User.to_string());

        let user = sqlx::query_as::<_, User>(&format!(
            r#"WITH inserted AS (
                   INSERT INTO users (name, email, password, role_id, is_active)
                   VALUES ($1, $2, $3, (SELECT id FROM roles WHERE name = $4), $5)
                   RETURNING *
               )
               SELECT {USER_COLUMNS}
               FROM inserted u
               LEFT JOIN roles r ON r.id = u.role_id"#
        ))
        .bind(dto.name.trim())
        .bind(dto.email.trim().to_lowercase())
        .bind(password)
        .bind(role)
        .bind(dto.is_active.unwrap_or(true))
        .fetch_one(db)
        .await
        .map_err(map_unique_email)?;

        crate::audit_event!("create", "users", user_id = %user.id, "User created");
        Ok(user)
    }

    #[instrument(skip(db, dto))]
    pub async fn update_user(db: &PgPool, id: UserId, dto: UpdateUserDto) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"WITH updated AS (
                   UPDATE users SET
                       name = COALESCE($2, name),
                       email = COALESCE($3, email),
                       role_id = COALESCE((SELECT id FROM roles WHERE name = $4), role_id),
                       is_active = COALESCE($5, is_active),
                       updated_at = NOW()
                   WHERE id = $1
                   RETURNING *
               )
               SELECT {USER_COLUMNS}
               FROM updated u
               LEFT JOIN roles r ON r.id = u.role_id"#
        ))
        .bind(id)
        .bind(dto.name.as_deref().map(str::trim))
        .bind(dto.email.map(|e| e.trim().to_lowercase()))
        .bind(dto.role)
        .bind(dto.is_active)
        .fetch_optional(db)
        .await
        .map_err(map_unique_email)?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        crate::audit_event!("update", "users", user_id = %user.id, "User updated");
        Ok(user)
    }

    #[instrument(skip(db))]
    pub async fn delete_user(db: &PgPool, actor: UserId, id: UserId) -> Result<(), AppError> {
        if actor == id {
            return Err(AppError::bad_request(anyhow!(
                "You cannot delete your own account"
            )));
        }

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("User not found")));
        }

        crate::audit_event!("delete", "users", user_id = %id, actor = %actor, "User deleted");
        Ok(())
    }

    /// Login lookup by email, including the password hash.
    #[instrument(skip(db))]
    pub async fn find_credentials(
        db: &PgPool,
        email: &str,
    ) -> Result<Option<UserCredentials>, AppError> {
        let credentials = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, password, is_active FROM users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await
        .context("Failed to look up credentials")?;

        Ok(credentials)
    }
}
