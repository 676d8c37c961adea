use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};

use crate::middleware::auth::require_auth;
use crate::state::AppState;

use super::controller::{login_user, logout, me, refresh_token};

pub fn init_auth_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/login", post(login_user))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route(
            "/me",
            get(me).route_layer(from_fn_with_state(state.auth.clone(), require_auth)),
        )
}
