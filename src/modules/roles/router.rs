use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use tapak_core::{Action, Resource};

use crate::middleware::auth::require_auth;
use crate::require_permission;
use crate::state::AppState;

use super::controller::{get_roles, grant_permission, revoke_permission};

pub fn init_roles_router(state: &AppState) -> Router<AppState> {
    let checker = || state.permissions.clone();

    Router::new()
        .route(
            "/",
            get(get_roles).route_layer(require_permission!(checker(), Resource::Roles, Action::Read)),
        )
        .route(
            "/{role}/permissions",
            post(grant_permission)
                .route_layer(require_permission!(checker(), Resource::Roles, Action::Update)),
        )
        .route(
            "/{role}/permissions/{resource}/{action}",
            delete(revoke_permission)
                .route_layer(require_permission!(checker(), Resource::Roles, Action::Update)),
        )
        .route_layer(from_fn_with_state(state.auth.clone(), require_auth))
}
