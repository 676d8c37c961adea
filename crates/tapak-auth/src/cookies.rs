//! Auth token cookies.
//!
//! [`CookieHelper`] writes and reads the `access_token` and `refresh_token`
//! cookies. Every cookie it sets is `HttpOnly` and `SameSite=Strict`; the
//! `Secure` flag is on exactly when the app environment is `production`.
//!
//! The refresh cookie is a session cookie (no `Max-Age`) scoped to the auth
//! routes. The access cookie lives as long as the access token.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration as CookieDuration;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

pub const ACCESS_TOKEN_PATH: &str = "/";
pub const REFRESH_TOKEN_PATH: &str = "/api/auth";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookieHelper {
    secure: bool,
}

impl CookieHelper {
    /// `environment` is the `APP_ENV` value; only `"production"` enables `Secure`.
    pub fn new(environment: &str) -> Self {
        Self {
            secure: environment == "production",
        }
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    fn build(&self, name: &'static str, value: String, path: &'static str) -> Cookie<'static> {
        Cookie::build((name, value))
            .path(path)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .build()
    }

    pub fn set_access_token_cookie(
        &self,
        jar: CookieJar,
        token: &str,
        expiry_seconds: i64,
    ) -> CookieJar {
        let mut cookie = self.build(ACCESS_TOKEN_COOKIE, token.to_string(), ACCESS_TOKEN_PATH);
        cookie.set_max_age(CookieDuration::seconds(expiry_seconds));
        jar.add(cookie)
    }

    pub fn set_refresh_token_cookie(&self, jar: CookieJar, token: &str) -> CookieJar {
        jar.add(self.build(REFRESH_TOKEN_COOKIE, token.to_string(), REFRESH_TOKEN_PATH))
    }

    /// Returns the access token cookie value, or an empty string.
    pub fn get_access_token(&self, jar: &CookieJar) -> String {
        jar.get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .unwrap_or_default()
    }

    /// Returns the refresh token cookie value, or an empty string.
    pub fn get_refresh_token(&self, jar: &CookieJar) -> String {
        jar.get(REFRESH_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .unwrap_or_default()
    }

    fn expired(&self, name: &'static str, path: &'static str) -> Cookie<'static> {
        let mut cookie = self.build(name, String::new(), path);
        cookie.set_max_age(CookieDuration::ZERO);
        cookie
    }

    pub fn clear_refresh_token_cookie(&self, jar: CookieJar) -> CookieJar {
        jar.add(self.expired(REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_PATH))
    }

    pub fn clear_all_auth_cookies(&self, jar: CookieJar) -> CookieJar {
        let jar = self.clear_refresh_token_cookie(jar);
        jar.add(self.expired(ACCESS_TOKEN_COOKIE, ACCESS_TOKEN_PATH))
    }
}
