//! Per-client rate limiting backed by `governor` keyed token buckets.
//!
//! Clients are keyed by the socket peer address. Only when the config trusts
//! a reverse proxy are the first `X-Forwarded-For` entry and then
//! `X-Real-IP` consulted. Requests with no usable key share the `unknown`
//! bucket.
//!
//! Buckets that have refilled are pruned periodically, so the key store
//! stays bounded by the number of recently active clients.

use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota,
    clock::{Clock, DefaultClock},
};

use tapak_config::RateLimitConfig;
use tapak_core::AppError;

use crate::metrics::track_rate_limited;

pub const UNKNOWN_CLIENT: &str = "unknown";
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct RateLimiter {
    scope: &'static str,
    trust_proxy: bool,
    limiter: Option<Arc<DefaultKeyedRateLimiter<String>>>,
}

impl RateLimiter {
    pub fn new(scope: &'static str, quota: Quota) -> Self {
        Self {
            scope,
            trust_proxy: false,
            limiter: Some(Arc::new(DefaultKeyedRateLimiter::keyed(quota))),
        }
    }

    /// A limiter that lets everything through.
    pub fn disabled(scope: &'static str) -> Self {
        Self {
            scope,
            trust_proxy: false,
            limiter: None,
        }
    }

    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    fn from_config(scope: &'static str, config: &RateLimitConfig, quota: Quota) -> Self {
        let limiter = if config.enabled {
            Self::new(scope, quota)
        } else {
            Self::disabled(scope)
        };
        limiter.trusting_proxy(config.trust_proxy)
    }

    /// Limiter for everything under `/api` except the auth routes.
    pub fn general(config: &RateLimitConfig) -> Self {
        Self::from_config("general", config, config.general_quota())
    }

    /// Stricter limiter for `/api/auth`.
    pub fn auth(config: &RateLimitConfig) -> Self {
        Self::from_config("auth", config, config.auth_quota())
    }

    /// `Err` carries how long the client should wait.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        limiter
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    pub fn key_for(&self, req: &Request) -> String {
        client_key(req, self.trust_proxy)
    }

    /// Number of clients currently holding a bucket.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.as_ref().map_or(0, |limiter| limiter.len())
    }

    /// Drops buckets that have fully refilled.
    pub fn prune(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    /// Prunes every `every` until the limiter is dropped. Must be called
    /// inside a Tokio runtime.
    pub fn spawn_pruner(&self, every: Duration) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        let weak: Weak<DefaultKeyedRateLimiter<String>> = Arc::downgrade(limiter);
        let scope = self.scope;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = weak.upgrade() else {
                    break;
                };
                limiter.retain_recent();
                limiter.shrink_to_fit();
                tracing::trace!(scope, clients = limiter.len(), "Pruned rate limit buckets");
            }
        });
    }
}

fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn peer_ip(req: &Request) -> Option<String> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

/// Bucket key for `req`. Forwarding headers are ignored unless
/// `trust_proxy` is set.
pub fn client_key(req: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = header_str(req, "x-forwarded-for") {
            if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
                return first.to_string();
            }
        }

        if let Some(real_ip) = header_str(req, "x-real-ip") {
            return real_ip.to_string();
        }
    }

    peer_ip(req).unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn rate_limit(State(limiter): State<RateLimiter>, req: Request, next: Next) -> Response {
    let key = limiter.key_for(&req);

    match limiter.check(&key) {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            track_rate_limited(limiter.scope);
            crate::security_event!(
                "rate_limit.exceeded",
                client = %key,
                scope = limiter.scope,
                "Rate limit exceeded"
            );

            let retry_after = (wait.as_secs() + u64::from(wait.subsec_nanos() > 0)).max(1);
            let mut response =
                AppError::too_many_requests(anyhow!("Too many requests, please try again later"))
                    .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
