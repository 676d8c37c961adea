use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use tapak_core::{Action, Resource};

use crate::middleware::auth::require_auth;
use crate::require_permission;
use crate::state::AppState;

use super::controller::{create_user, delete_user, get_user, get_users, update_user};

pub fn init_users_router(state: &AppState) -> Router<AppState> {
    let checker = || state.permissions.clone();

    Router::new()
        .route(
            "/",
            get(get_users)
                .route_layer(require_permission!(checker(), Resource::Users, Action::Read))
                .merge(post(create_user).route_layer(require_permission!(
                    checker(),
                    Resource::Users,
                    Action::Create
                ))),
        )
        .route(
            "/{id}",
            get(get_user)
                .route_layer(require_permission!(checker(), Resource::Users, Action::Read))
                .merge(put(update_user).route_layer(require_permission!(
                    checker(),
                    Resource::Users,
                    Action::Update
                )))
                .merge(delete(delete_user).route_layer(require_permission!(
                    checker(),
                    Resource::Users,
                    Action::Delete
                ))),
        )
        .route_layer(from_fn_with_state(state.auth.clone(), require_auth))
}
