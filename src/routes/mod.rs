//! Router assembly: all route groups plus CORS, request tracing, and body-size limit.
//! The body limit is enforced by the JSON extractor, so oversized bodies surface as `AppError`.

mod clients;
mod common;
mod entity;

pub use clients::client_routes;
pub use common::common_routes;
pub use entity::entity_routes;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Full application router.
pub fn app(state: AppState) -> Router {
    let body_limit = state.settings.body_limit_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(client_routes(state.clone()))
        .merge(entity_routes(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
