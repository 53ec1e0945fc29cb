//! Entity CRUD handlers: list, read, create, update, soft delete, permanent delete, cleanup.

use crate::error::AppError;
use crate::extractors::Actor;
use crate::records::{list_filters, prepare_record, EntityDef};
use crate::response::{created, deleted, success_many, success_message, success_one};
use crate::service::{CrudService, WriteMode};
use crate::state::AppState;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;

fn parse_id(id_str: &str) -> Result<Value, AppError> {
    let n: i64 = id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id: {}", id_str)))?;
    Ok(Value::from(n))
}

fn parse_bool_param(params: &HashMap<String, String>, key: &str) -> Result<bool, AppError> {
    match params.get(key).map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(s) if s.is_empty() || s == "false" || s == "0" => Ok(false),
        Some(s) if s == "true" || s == "1" => Ok(true),
        Some(s) => Err(AppError::BadRequest(format!("{} must be true or false, got {}", key, s))),
    }
}

fn parse_u32_param(params: &HashMap<String, String>, key: &str) -> Result<Option<u32>, AppError> {
    params
        .get(key)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", key))))
        .transpose()
}

/// Run a write on its own task so a client disconnect does not cancel a statement already issued.
async fn detached<T, F>(fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| AppError::Internal(format!("write task failed: {}", e)))?
}

fn relabel_not_found(e: AppError, message: String) -> AppError {
    match e {
        AppError::NotFound(_) => AppError::NotFound(message),
        e => e,
    }
}

pub async fn list(
    state: &AppState,
    entity: &'static EntityDef,
    params: HashMap<String, String>,
) -> Result<Response, AppError> {
    let include_inactive = parse_bool_param(&params, "includeInactive")?;
    let limit = parse_u32_param(&params, "limit")?;
    let offset = parse_u32_param(&params, "offset")?;
    let filters = list_filters(entity, &params);
    let store = state.store(entity.table.schema);
    let rows = CrudService::list(store, entity.table, &filters, include_inactive, limit, offset).await?;
    Ok(success_many(rows).into_response())
}

pub async fn read(state: &AppState, entity: &'static EntityDef, id: String) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let store = state.store(entity.table.schema);
    let row = CrudService::read(store, entity.table, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", entity.label)))?;
    Ok(success_one(row).into_response())
}

pub async fn create(
    state: &AppState,
    entity: &'static EntityDef,
    Actor(actor): Actor,
    body: Value,
) -> Result<Response, AppError> {
    let record = prepare_record(entity, body, &WriteMode::Insert, &state.settings)?;
    let writer = state.writer(entity.table.schema);
    let persisted = detached(async move {
        writer
            .write(entity.table, record, WriteMode::Insert, actor.as_deref())
            .await
    })
    .await?;
    Ok(created(persisted.id, persisted.row).into_response())
}

pub async fn update(
    state: &AppState,
    entity: &'static EntityDef,
    Actor(actor): Actor,
    id: String,
    body: Value,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let mode = WriteMode::Update { id };
    let record = prepare_record(entity, body, &mode, &state.settings)?;
    let writer = state.writer(entity.table.schema);
    let persisted = detached(async move { writer.write(entity.table, record, mode, actor.as_deref()).await })
        .await
        .map_err(|e| relabel_not_found(e, format!("{} not found or no changes made", entity.label)))?;
    Ok(success_one(persisted.row).into_response())
}

/// Soft delete: flag the row inactive. Idempotent.
pub async fn deactivate(
    state: &AppState,
    entity: &'static EntityDef,
    Actor(actor): Actor,
    id: String,
) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let writer = state.writer(entity.table.schema);
    detached(async move { writer.deactivate(entity.table, id, actor.as_deref()).await })
        .await
        .map_err(|e| relabel_not_found(e, format!("{} not found", entity.label)))?;
    Ok(success_message(format!("{} deactivated", entity.label)).into_response())
}

/// Hard delete of one row that is already inactive.
pub async fn purge_one(state: &AppState, entity: &'static EntityDef, id: String) -> Result<Response, AppError> {
    let id = parse_id(&id)?;
    let store = state.stores.get(entity.table.schema).clone();
    detached(async move { CrudService::purge_one(store.as_ref(), entity.table, &id).await })
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound(format!("{} not found", entity.label)),
            AppError::StillActive { field, .. } => AppError::StillActive {
                field,
                message: format!("{} must be deactivated before permanent deletion", entity.label),
            },
            e => e,
        })?;
    Ok(success_message(format!("{} permanently deleted", entity.label)).into_response())
}

/// Hard delete of every inactive row.
pub async fn purge_inactive(state: &AppState, entity: &'static EntityDef) -> Result<Response, AppError> {
    let store = state.stores.get(entity.table.schema).clone();
    let count = detached(async move { CrudService::purge_inactive(store.as_ref(), entity.table).await }).await?;
    Ok(deleted(count).into_response())
}

/// Axum handler functions for one entity, delegating to the generic handlers above.
macro_rules! entity_handlers {
    ($module:ident, $entity:path) => {
        pub mod $module {
            use crate::error::AppError;
            use crate::extractors::Actor;
            use crate::state::AppState;
            use axum::extract::rejection::JsonRejection;
            use axum::extract::{Path, Query, State};
            use axum::response::Response;
            use axum::Json;
            use serde_json::Value;
            use std::collections::HashMap;

            pub async fn list(
                State(state): State<AppState>,
                Query(params): Query<HashMap<String, String>>,
            ) -> Result<Response, AppError> {
                super::list(&state, &$entity, params).await
            }

            pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
                super::read(&state, &$entity, id).await
            }

            pub async fn create(
                State(state): State<AppState>,
                actor: Actor,
                body: Result<Json<Value>, JsonRejection>,
            ) -> Result<Response, AppError> {
                let Json(body) = body?;
                super::create(&state, &$entity, actor, body).await
            }

            pub async fn update(
                State(state): State<AppState>,
                actor: Actor,
                Path(id): Path<String>,
                body: Result<Json<Value>, JsonRejection>,
            ) -> Result<Response, AppError> {
                let Json(body) = body?;
                super::update(&state, &$entity, actor, id, body).await
            }

            pub async fn deactivate(
                State(state): State<AppState>,
                actor: Actor,
                Path(id): Path<String>,
            ) -> Result<Response, AppError> {
                super::deactivate(&state, &$entity, actor, id).await
            }

            pub async fn purge_one(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, AppError> {
                super::purge_one(&state, &$entity, id).await
            }

            pub async fn purge_inactive(State(state): State<AppState>) -> Result<Response, AppError> {
                super::purge_inactive(&state, &$entity).await
            }
        }
    };
}

entity_handlers!(organizations, crate::records::ORGANIZATION);
entity_handlers!(providers, crate::records::PROVIDER);
entity_handlers!(locations, crate::records::LOCATION);
