//! Chatbot schema routes.

use crate::handlers::list_clients;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn client_routes(state: AppState) -> Router {
    Router::new().route("/api/clients", get(list_clients)).with_state(state)
}
