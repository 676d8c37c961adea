use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use tapak_core::{Action, Resource};

use crate::middleware::auth::require_auth;
use crate::modules::moduls::init_moduls_router;
use crate::require_permission;
use crate::state::AppState;

use super::controller::{create_project, delete_project, get_project, get_projects, update_project};

pub fn init_projects_router(state: &AppState) -> Router<AppState> {
    let checker = || state.permissions.clone();

    Router::new()
        .route(
            "/",
            get(get_projects)
                .route_layer(require_permission!(checker(), Resource::Projects, Action::Read))
                .merge(post(create_project).route_layer(require_permission!(
                    checker(),
                    Resource::Projects,
                    Action::Create
                ))),
        )
        .route(
            "/{id}",
            get(get_project)
                .route_layer(require_permission!(checker(), Resource::Projects, Action::Read))
                .merge(put(update_project).route_layer(require_permission!(
                    checker(),
                    Resource::Projects,
                    Action::Update
                )))
                .merge(delete(delete_project).route_layer(require_permission!(
                    checker(),
                    Resource::Projects,
                    Action::Delete
                ))),
        )
        .nest("/{id}/moduls", init_moduls_router(state))
        .route_layer(from_fn_with_state(state.auth.clone(), require_auth))
}
