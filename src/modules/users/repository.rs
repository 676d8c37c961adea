//! Identity lookups used by the auth middleware.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use tapak_core::AppError;
use tapak_models::{UserId, UserIdentity};

/// Loads the caller behind a verified token subject.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_identity(&self, id: UserId) -> Result<Option<UserIdentity>, AppError>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_identity(&self, id: UserId) -> Result<Option<UserIdentity>, AppError> {
        let identity = sqlx::query_as::<_, UserIdentity>(
            r#"SELECT u.id, u.email, r.name AS role, u.is_active
               FROM users u
               LEFT JOIN roles r ON r.id = u.role_id
               WHERE u.id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(identity)
    }
}
