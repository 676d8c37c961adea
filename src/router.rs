use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use tapak_config::CorsConfig;

use crate::docs::ApiDoc;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::body_logging::body_logging_middleware;
use crate::middleware::rate_limit::{PRUNE_INTERVAL, RateLimiter, rate_limit};
use crate::middleware::request_id::{REQUEST_ID_HEADER, request_id_middleware};
use crate::middleware::tus::{
    TUS_EXTENSION, TUS_MAX_SIZE, TUS_RESUMABLE, TUS_VERSION, UPLOAD_LENGTH, UPLOAD_METADATA,
    UPLOAD_OFFSET,
};
use crate::modules::auth::init_auth_router;
use crate::modules::health::init_health_router;
use crate::modules::projects::init_projects_router;
use crate::modules::roles::init_roles_router;
use crate::modules::uploads::init_uploads_router;
use crate::modules::users::init_users_router;
use crate::state::AppState;

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let config = config.clone();
    let allowed_origins = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
        origin.to_str().is_ok_and(|origin| config.allows(origin))
    });

    let tus_headers = [
        TUS_RESUMABLE,
        UPLOAD_LENGTH,
        UPLOAD_OFFSET,
        UPLOAD_METADATA,
    ];

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers(
            [
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                header::ACCEPT,
                REQUEST_ID_HEADER,
            ]
            .into_iter()
            .chain(tus_headers.clone())
            .collect::<Vec<HeaderName>>(),
        )
        .expose_headers(
            [
                header::LOCATION,
                header::RETRY_AFTER,
                REQUEST_ID_HEADER,
                TUS_VERSION,
                TUS_EXTENSION,
                TUS_MAX_SIZE,
            ]
            .into_iter()
            .chain(tus_headers)
            .collect::<Vec<HeaderName>>(),
        )
        .allow_credentials(true)
}

/// `/api` routes with their rate limiters. The auth endpoints get the strict
/// bucket, everything else the general one.
fn api_router(state: &AppState) -> Router<AppState> {
    let auth_limiter = RateLimiter::auth(&state.rate_limit_config);
    let general_limiter = RateLimiter::general(&state.rate_limit_config);
    auth_limiter.spawn_pruner(PRUNE_INTERVAL);
    general_limiter.spawn_pruner(PRUNE_INTERVAL);

    let resources = Router::new()
        .nest("/users", init_users_router(state))
        .nest("/roles", init_roles_router(state))
        .nest("/projects", init_projects_router(state))
        .nest("/uploads", init_uploads_router(state))
        .layer(middleware::from_fn_with_state(general_limiter, rate_limit));

    Router::new()
        .nest(
            "/auth",
            init_auth_router(state).layer(middleware::from_fn_with_state(auth_limiter, rate_limit)),
        )
        .merge(resources)
}

/// Builds the application. Middleware, outermost first: request id, access
/// log, metrics, CORS, body logging, then the per-route auth, RBAC and TUS
/// layers.
pub fn init_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .merge(init_health_router())
        .nest("/api", api_router(&state))
        .with_state(state.clone())
        .layer(middleware::from_fn(body_logging_middleware))
        .layer(cors_layer(&state.cors_config))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
}
