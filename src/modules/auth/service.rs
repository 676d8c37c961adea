use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{Instrument, instrument};

use tapak_auth::{create_access_token, create_refresh_token, verify_refresh_token};
use tapak_config::JwtConfig;
use tapak_core::{AppError, verify_dummy_password, verify_password};
use tapak_models::{LoginRequest, LoginResponse, TokenResponse, User, UserId};

use crate::metrics::{track_jwt_issued, track_user_login_failure, track_user_login_success};
use crate::modules::users::service::UserService;
use crate::utils::tracing::{record_auth_result, record_user_id};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
pub const INVALID_REFRESH_MESSAGE: &str = "Invalid or expired refresh token";

fn invalid_credentials(reason: &'static str) -> AppError {
    track_user_login_failure(reason);
    record_auth_result(false);
    crate::security_event!("auth.login_failed", reason = reason, "Login rejected");
    AppError::unauthorized(anyhow!(INVALID_CREDENTIALS_MESSAGE))
}

fn issue_tokens(user: &User, jwt_config: &JwtConfig) -> Result<TokenResponse, AppError> {
    let access_token = create_access_token(user.id.into_inner(), &user.email, jwt_config)?;
    let refresh_token = create_refresh_token(user.id.into_inner(), &user.email, jwt_config)?;
    track_jwt_issued();

    Ok(TokenResponse::bearer(
        access_token,
        refresh_token,
        jwt_config.access_token_expiry,
    ))
}

pub struct AuthService;

impl AuthService {
    /// Unknown email, wrong password and inactive account all produce the
    /// same 401.
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        async move {
            let Some(credentials) = UserService::find_credentials(db, &dto.email).await? else {
                verify_dummy_password(&dto.password);
                return Err(invalid_credentials("unknown_email"));
            };

            if !verify_password(&dto.password, &credentials.password)? {
                return Err(invalid_credentials("wrong_password"));
            }

            if !credentials.is_active {
                return Err(invalid_credentials("inactive_user"));
            }

            let user = UserService::get_user(db, credentials.id).await?;
            let tokens = issue_tokens(&user, jwt_config)?;

            record_user_id(&user.id.to_string());
            record_auth_result(true);
            track_user_login_success();
            tracing::info!(user_id = %user.id, "User logged in");

            Ok(LoginResponse { tokens, user })
        }
        .instrument(crate::auth_span!("login"))
        .await
    }

    /// Exchanges a refresh token for a new access token and a rotated
    /// refresh token.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(
        db: &PgPool,
        refresh_token: &str,
        jwt_config: &JwtConfig,
    ) -> Result<TokenResponse, AppError> {
        if refresh_token.is_empty() {
            return Err(AppError::unauthorized(anyhow!("Refresh token is required")));
        }

        let claims = verify_refresh_token(refresh_token, jwt_config)?;
        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| AppError::unauthorized(anyhow!(INVALID_REFRESH_MESSAGE)))?;

        let user = match UserService::get_user(db, user_id).await {
            Ok(user) => user,
            Err(e) if e.status.is_client_error() => {
                return Err(AppError::unauthorized(anyhow!(INVALID_REFRESH_MESSAGE)));
            }
            Err(e) => return Err(e),
        };

        if !user.is_active {
            crate::security_event!("auth.refresh_rejected", user_id = %user.id, "Refresh for inactive user");
            return Err(AppError::unauthorized(anyhow!(INVALID_REFRESH_MESSAGE)));
        }

        issue_tokens(&user, jwt_config)
    }
}
