//! Authentication middleware.
//!
//! [`require_auth`] resolves the caller from a bearer token (or, when no
//! `Authorization` header is sent, the `access_token` cookie), verifies it,
//! loads the user and stores an [`AuthContext`] in the request extensions.
//! Handlers read it back with the [`AuthUser`] extractor.
//!
//! Every failure is a 401. Only a malformed `Authorization` header gets its
//! own message; everything else collapses into the same generic response.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use tapak_auth::{CookieHelper, TokenVerifier};
use tapak_core::AppError;
use tapak_models::UserId;

use crate::metrics::track_auth_failure;
use crate::modules::users::repository::UserRepository;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const INVALID_TOKEN_FORMAT_MESSAGE: &str = "Invalid token format";

/// Identity of the authenticated caller for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
    /// Role name, empty when the user has no role.
    pub role: String,
    /// The raw access token the request authenticated with.
    pub access_token: String,
}

/// Collaborators the auth middleware needs, constructed once at startup.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    users: Arc<dyn UserRepository>,
    cookies: CookieHelper,
}

fn reject(reason: &'static str, message: &'static str) -> AppError {
    track_auth_failure(reason);
    crate::security_event!("auth.rejected", reason = reason, "Authentication failed");
    AppError::unauthorized(anyhow!(message))
}

/// Token from a well-formed `Authorization: Bearer <token>` header.
///
/// `Ok(None)` means the header is absent. A present header must be exactly
/// two space-separated parts with the scheme `Bearer`.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let malformed = || reject("invalid_format", INVALID_TOKEN_FORMAT_MESSAGE);
    let value = value.to_str().map_err(|_| malformed())?;

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(Some((*token).to_string())),
        _ => Err(malformed()),
    }
}

impl AuthGate {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        users: Arc<dyn UserRepository>,
        cookies: CookieHelper,
    ) -> Self {
        Self {
            verifier,
            users,
            cookies,
        }
    }

    /// Header token if present, else the access token cookie.
    pub fn extract_token(&self, headers: &HeaderMap, jar: &CookieJar) -> Result<String, AppError> {
        match bearer_token(headers)? {
            Some(token) => Ok(token),
            None => Ok(self.cookies.get_access_token(jar)),
        }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        let jar = CookieJar::from_headers(headers);
        let token = self.extract_token(headers, &jar)?;
        if token.is_empty() {
            return Err(reject("missing_token", UNAUTHORIZED_MESSAGE));
        }

        let claims = self
            .verifier
            .verify(&token)
            .map_err(|_| reject("invalid_token", UNAUTHORIZED_MESSAGE))?;

        let user_id: UserId = claims
            .sub
            .parse()
            .map_err(|_| reject("invalid_subject", UNAUTHORIZED_MESSAGE))?;

        let user = match self.users.find_identity(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(reject("user_not_found", UNAUTHORIZED_MESSAGE)),
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "User lookup failed during authentication");
                return Err(reject("lookup_failed", UNAUTHORIZED_MESSAGE));
            }
        };

        if !user.is_active {
            return Err(reject("inactive_user", UNAUTHORIZED_MESSAGE));
        }

        Ok(AuthContext {
            user_id: user.id,
            email: user.email,
            role: user.role.unwrap_or_default(),
            access_token: token,
        })
    }
}

pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let context = gate.authenticate(req.headers()).await?;
    crate::utils::tracing::record_user_id(&context.user_id.to_string());
    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Extractor for the identity stored by [`require_auth`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl AuthUser {
    pub fn user_id(&self) -> UserId {
        self.0.user_id
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }

    pub fn role(&self) -> &str {
        &self.0.role
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized(anyhow!(UNAUTHORIZED_MESSAGE)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(authorization: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(authorization).unwrap(),
        );
        headers
    }

    #[test]
    fn test_absent_header_falls_through() {
        assert!(bearer_token(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn test_well_formed_header() {
        assert_eq!(
            bearer_token(&headers("Bearer abc.def.ghi")).unwrap().as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_malformed_headers() {
        for value in [
            "",
            "Bearer",
            "Bearer ",
            "bearer abc",
            "Basic abc",
            "Bearer abc extra",
            "Bearer  abc",
            "abc",
        ] {
            let err = bearer_token(&headers(value)).unwrap_err();
            assert_eq!(err.status.as_u16(), 401, "value: {:?}", value);
            assert_eq!(err.error.to_string(), INVALID_TOKEN_FORMAT_MESSAGE);
        }
    }

    struct AcceptAll;

    impl TokenVerifier for AcceptAll {
        fn verify(&self, token: &str) -> Result<tapak_auth::Claims, AppError> {
            Ok(tapak_auth::Claims {
                sub: token.to_string(),
                email: "ani@example.com".to_string(),
                typ: tapak_auth::TokenType::Access,
                exp: usize::MAX,
                iat: 0,
            })
        }
    }

    struct OneUser(tapak_models::UserIdentity);

    #[async_trait::async_trait]
    impl UserRepository for OneUser {
        async fn find_identity(
            &self,
            id: UserId,
        ) -> Result<Option<tapak_models::UserIdentity>, AppError> {
            Ok((self.0.id == id).then(|| self.0.clone()))
        }
    }

    #[tokio::test]
    async fn test_malformed_header_wins_over_cookie() {
        let user = tapak_models::UserIdentity {
            id: UserId::new(),
            email: "ani@example.com".to_string(),
            role: Some("user".to_string()),
            is_active: true,
        };
        let gate = AuthGate::new(
            Arc::new(AcceptAll),
            Arc::new(OneUser(user.clone())),
            CookieHelper::new("development"),
        );
        let cookie = format!("access_token={}", user.id);

        let mut with_cookie = HeaderMap::new();
        with_cookie.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
        let context = gate.authenticate(&with_cookie).await.unwrap();
        assert_eq!(context.user_id, user.id);

        for value in ["Token x", "Bearer a b", "Bearer"] {
            let mut headers = headers(value);
            headers.insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());

            let err = gate.authenticate(&headers).await.unwrap_err();
            assert_eq!(err.status.as_u16(), 401, "value: {:?}", value);
            assert_eq!(err.error.to_string(), INVALID_TOKEN_FORMAT_MESSAGE);
        }
    }
}
