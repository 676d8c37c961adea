use axum::{
    Router,
    routing::{delete, get, post, put},
};

use tapak_core::{Action, Resource};

use crate::require_permission;
use crate::state::AppState;

use super::controller::{create_modul, delete_modul, get_modul, get_moduls, update_modul};

/// Nested under `/api/projects/{id}/moduls`; authentication comes from the
/// projects router.
pub fn init_moduls_router(state: &AppState) -> Router<AppState> {
    let checker = || state.permissions.clone();

    Router::new()
        .route(
            "/",
            get(get_moduls)
                .route_layer(require_permission!(checker(), Resource::Moduls, Action::Read))
                .merge(post(create_modul).route_layer(require_permission!(
                    checker(),
                    Resource::Moduls,
                    Action::Create
                ))),
        )
        .route(
            "/{modul_id}",
            get(get_modul)
                .route_layer(require_permission!(checker(), Resource::Moduls, Action::Read))
                .merge(put(update_modul).route_layer(require_permission!(
                    checker(),
                    Resource::Moduls,
                    Action::Update
                )))
                .merge(delete(delete_modul).route_layer(require_permission!(
                    checker(),
                    Resource::Moduls,
                    Action::Delete
                ))),
        )
}
