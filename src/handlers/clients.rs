//! Chatbot clients listing via stored procedure.

use crate::config::{Schema, CHATBOT_CLIENTS_PROCEDURE};
use crate::error::AppError;
use crate::service::CrudService;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

/// All filters optional; blank values are passed as NULL.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientsQuery {
    pub client_id: Option<String>,
    pub account_id: Option<String>,
    pub client_name: Option<String>,
}

impl ClientsQuery {
    fn procedure_args(self) -> Result<Vec<Value>, AppError> {
        let non_blank = |s: Option<String>| s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let client_id = match non_blank(self.client_id) {
            Some(s) => Value::from(
                s.parse::<i64>()
                    .map_err(|_| AppError::BadRequest("clientId must be an integer".into()))?,
            ),
            None => Value::Null,
        };
        Ok(vec![
            client_id,
            non_blank(self.account_id).map(Value::String).unwrap_or(Value::Null),
            non_blank(self.client_name).map(Value::String).unwrap_or(Value::Null),
        ])
    }
}

/// GET /api/clients — rows of the procedure's first result set, as a bare array.
pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ClientsQuery>,
) -> Result<Json<Vec<Value>>, AppError> {
    let args = query.procedure_args()?;
    let rows = CrudService::call(state.store(Schema::Chatbot), CHATBOT_CLIENTS_PROCEDURE, args).await?;
    Ok(Json(rows))
}
