//! Entity CRUD routes: organizations and locations (EVAA config), providers (scribe).
//! DELETE /:id is a soft delete; /:id/permanent and /cleanup only remove inactive rows.

use crate::handlers::{locations, organizations, providers};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

macro_rules! entity_router {
    ($handlers:ident) => {
        Router::new()
            .route("/", get($handlers::list).post($handlers::create))
            .route("/cleanup", post($handlers::purge_inactive))
            .route(
                "/:id",
                get($handlers::read).put($handlers::update).delete($handlers::deactivate),
            )
            .route("/:id/permanent", delete($handlers::purge_one))
    };
}

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api/organizations", entity_router!(organizations))
        .nest("/api/providers", entity_router!(providers))
        .nest("/api/locations", entity_router!(locations))
        .with_state(state)
}
