use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{MethodRouter, delete, get, head, options, patch, post},
};

use tapak_core::{Action, Resource};

use crate::middleware::auth::require_auth;
use crate::middleware::tus::tus_protocol;
use crate::require_permission;
use crate::state::AppState;

use super::controller::{
    create_upload, delete_upload, get_uploads, upload_chunk, upload_options, upload_status,
};

/// RBAC runs before the TUS handshake, which runs before the handler.
fn guarded(
    state: &AppState,
    route: MethodRouter<AppState>,
    action: Action,
) -> MethodRouter<AppState> {
    route
        .route_layer(from_fn_with_state(state.tus_config.clone(), tus_protocol))
        .route_layer(require_permission!(
            state.permissions.clone(),
            Resource::Uploads,
            action
        ))
}

pub fn init_uploads_router(state: &AppState) -> Router<AppState> {
    let body_limit = usize::try_from(state.tus_config.max_size).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/",
            guarded(state, post(create_upload), Action::Create)
                .merge(guarded(state, get(get_uploads), Action::Read))
                .merge(guarded(state, options(upload_options), Action::Read)),
        )
        .route(
            "/{id}",
            guarded(state, head(upload_status), Action::Read)
                .merge(guarded(state, patch(upload_chunk), Action::Update))
                .merge(guarded(state, delete(delete_upload), Action::Delete))
                .merge(guarded(state, options(upload_options), Action::Read)),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(from_fn_with_state(state.auth.clone(), require_auth))
}
