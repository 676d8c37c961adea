use anyhow::anyhow;
use axum::body::Bytes;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use tapak_core::{ApiResponse, AppError, ErrorResponse};
use tapak_models::{LoginRequest, LoginResponse, MeResponse, RefreshTokenRequest, TokenResponse};

use crate::middleware::auth::AuthUser;
use crate::middleware::request_id::CorrelationId;
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::AuthService;

fn with_token_cookies(state: &AppState, jar: CookieJar, tokens: &TokenResponse) -> CookieJar {
    let jar = state.cookies.set_access_token_cookie(
        jar,
        &tokens.access_token,
        state.jwt_config.access_token_expiry,
    );
    state.cookies.set_refresh_token_cookie(jar, &tokens.refresh_token)
}

/// Login and receive an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, token cookies set", body = LoginResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, jar, dto))]
pub async fn login_user(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    let response = AuthService::login_user(&state.db, dto, &state.jwt_config).await?;
    let jar = with_token_cookies(&state, jar, &response.tokens);
    Ok((jar, ApiResponse::ok("Login successful", response)))
}

/// Rotate the refresh token
///
/// The refresh token is read from the `refresh_token` cookie, falling back to
/// the JSON body.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body(content = RefreshTokenRequest, description = "Optional when the refresh cookie is present"),
    responses(
        (status = 200, description = "New token pair issued", body = TokenResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired refresh token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<(CookieJar, ApiResponse<TokenResponse>), AppError> {
    let mut token = state.cookies.get_refresh_token(&jar);

    if token.is_empty() && !body.is_empty() {
        let request: RefreshTokenRequest = serde_json::from_slice(&body)
            .map_err(|_| AppError::bad_request(anyhow!("Invalid request body")))?;
        token = request.refresh_token.unwrap_or_default();
    }

    let tokens = AuthService::refresh_tokens(&state.db, &token, &state.jwt_config).await?;
    let jar = with_token_cookies(&state, jar, &tokens);
    Ok((jar, ApiResponse::ok("Token refreshed successfully", tokens)))
}

/// Clear the auth cookies
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out, cookies cleared")
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, ApiResponse<()>) {
    let jar = state.cookies.clear_all_auth_cookies(jar);
    (jar, ApiResponse::message("Logged out successfully"))
}

/// The identity resolved for the current request
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = MeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
#[instrument(skip_all)]
pub async fn me(auth_user: AuthUser, CorrelationId(request_id): CorrelationId) -> ApiResponse<MeResponse> {
    ApiResponse::ok(
        "Current user",
        MeResponse {
            user_id: auth_user.user_id().to_string(),
            email: auth_user.email().to_string(),
            role: auth_user.role().to_string(),
            request_id,
        },
    )
}
