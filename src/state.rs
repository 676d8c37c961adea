//! Shared application state.
//!
//! Every collaborator is built once here and handed to the router. Tests swap
//! individual collaborators with the `with_*` builders.

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use tapak_auth::{CookieHelper, JwtVerifier, PermissionChecker, TokenVerifier};
use tapak_config::{AppConfig, CorsConfig, JwtConfig, RateLimitConfig, TusConfig, UploadConfig};
use tapak_db::{DatabaseConfig, init_db_pool};

use crate::middleware::auth::AuthGate;
use crate::modules::roles::PgPolicyStore;
use crate::modules::uploads::{LocalUploadStore, UploadStore};
use crate::modules::users::{PgUserRepository, UserRepository};

/// Everything read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub app: AppConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub tus: TusConfig,
    pub upload: UploadConfig,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            app: AppConfig::from_env(),
            jwt: JwtConfig::from_env(),
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            tus: TusConfig::from_env(),
            upload: UploadConfig::from_env(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub app_config: AppConfig,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub tus_config: TusConfig,
    pub upload_config: UploadConfig,
    pub cookies: CookieHelper,
    pub auth: AuthGate,
    pub permissions: Arc<dyn PermissionChecker>,
    pub storage: Arc<dyn UploadStore>,
}

impl AppState {
    /// Wires the PostgreSQL-backed collaborators.
    pub fn new(db: PgPool, settings: Settings) -> Self {
        let cookies = CookieHelper::new(&settings.app.environment);
        let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier::new(settings.jwt.clone()));
        let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db.clone()));

        Self {
            auth: AuthGate::new(verifier, users, cookies),
            permissions: Arc::new(PgPolicyStore::new(db.clone())),
            storage: Arc::new(LocalUploadStore::new(settings.upload.dir.clone())),
            db,
            cookies,
            app_config: settings.app,
            jwt_config: settings.jwt,
            cors_config: settings.cors,
            rate_limit_config: settings.rate_limit,
            tus_config: settings.tus,
            upload_config: settings.upload,
        }
    }

    pub fn with_auth(mut self, auth: AuthGate) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionChecker>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn UploadStore>) -> Self {
        self.storage = storage;
        self
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let db = init_db_pool(&db_config)
        .await
        .context("Failed to connect to the database")?;

    Ok(AppState::new(db, Settings::from_env()))
}
