//! Common routes: root banner, health, readiness, version.

use crate::config::Schema;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    databases: BTreeMap<&'static str, &'static str>,
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Unified Scribe Backend API" }))
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "OK",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let mut databases = BTreeMap::new();
    let mut all_ok = true;
    for schema in Schema::ALL {
        let ok = match state.store(schema).ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(schema = schema.name(), error = %e, "readiness check failed");
                false
            }
        };
        all_ok &= ok;
        databases.insert(schema.name(), if ok { "ok" } else { "unavailable" });
    }
    let (status, label) = if all_ok {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (status, Json(ReadyBody { status: label, databases }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// GET /, /api/health, /api/ready, /api/version.
pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/ready", get(ready))
        .route("/api/version", get(version))
        .with_state(state)
}
