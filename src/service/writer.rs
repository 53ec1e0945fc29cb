//! Column-filtered writer: INSERT/UPDATE using only the fields that are both allow-listed and
//! physically present in the target table, with audit columns stamped server-side.

use crate::config::TableSpec;
use crate::error::{AppError, ConfigError};
use crate::sql::{self, Assignment};
use crate::store::{ColumnSet, TableStore};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Logical field name -> value, already coerced to storage form.
pub type DesiredRecord = HashMap<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub enum WriteMode {
    Insert,
    Update { id: Value },
}

/// Row as read back after the write, with its primary key.
#[derive(Clone, Debug, PartialEq)]
pub struct Persisted {
    pub id: Value,
    pub row: Value,
}

#[derive(Clone)]
pub struct RecordWriter {
    store: Arc<dyn TableStore>,
    introspect: bool,
}

impl RecordWriter {
    pub fn new(store: Arc<dyn TableStore>, introspect: bool) -> Self {
        RecordWriter { store, introspect }
    }

    /// Live columns of the table; re-fetched on every call. With introspection off, the allow-list itself.
    pub async fn column_set(&self, table: &TableSpec) -> Result<ColumnSet, AppError> {
        if !self.introspect {
            return Ok(ColumnSet::new(
                table
                    .columns
                    .iter()
                    .copied()
                    .chain(table.audit.iter().map(|a| a.name))
                    .chain(std::iter::once(table.primary_key)),
            ));
        }
        let columns = self.store.list_columns(table.name).await?;
        if columns.is_empty() {
            return Err(ConfigError::InvalidTable {
                table: table.name,
                message: "table not found or has no columns".into(),
            }
            .into());
        }
        Ok(columns)
    }

    /// Write `record` into `table` and return the persisted row.
    pub async fn write(
        &self,
        table: &TableSpec,
        record: DesiredRecord,
        mode: WriteMode,
        actor: Option<&str>,
    ) -> Result<Persisted, AppError> {
        let columns = self.column_set(table).await?;
        let plan = plan_assignments(table, &columns, record, &mode, actor)?;
        match mode {
            WriteMode::Insert => {
                let q = sql::insert(table, &plan.assignments);
                let result = self
                    .store
                    .execute(&q.sql, &q.params)
                    .await
                    .map_err(|e| conflict_on_column(table, e))?;
                let id = if table.auto_increment {
                    if result.last_insert_id == 0 {
                        return Err(AppError::Internal(format!("{}: insert returned no generated key", table.name)));
                    }
                    Value::from(result.last_insert_id)
                } else {
                    plan.supplied_key
                        .ok_or_else(|| AppError::Validation(format!("{} is required", table.primary_key)))?
                };
                tracing::info!(table = table.name, id = %id, "inserted row");
                let row = self.read_back(table, &id).await?.ok_or_else(|| {
                    AppError::Internal(format!("{}: inserted row {} could not be read back", table.name, id))
                })?;
                Ok(Persisted { id, row })
            }
            WriteMode::Update { id } => {
                let q = sql::update(table, &id, &plan.assignments);
                let result = self
                    .store
                    .execute(&q.sql, &q.params)
                    .await
                    .map_err(|e| conflict_on_column(table, e))?;
                let row = self
                    .read_back(table, &id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("{} {} not found", table.name, id)))?;
                tracing::info!(table = table.name, id = %id, rows = result.rows_affected, "updated row");
                Ok(Persisted { id, row })
            }
        }
    }

    /// Soft delete: set the active flag to 0 through the regular update path.
    pub async fn deactivate(&self, table: &TableSpec, id: Value, actor: Option<&str>) -> Result<Persisted, AppError> {
        let active = table
            .active_column
            .ok_or_else(|| AppError::BadRequest(format!("{} does not support soft delete", table.name)))?;
        let record: DesiredRecord = [(active.to_string(), Value::from(0))].into();
        self.write(table, record, WriteMode::Update { id }, actor).await
    }

    async fn read_back(&self, table: &TableSpec, id: &Value) -> Result<Option<Value>, AppError> {
        let q = sql::select_by_id(table, id);
        self.store.fetch_optional(&q.sql, &q.params).await
    }
}

/// Assignments for one write, plus the caller-supplied key for tables without generated keys.
#[derive(Debug, PartialEq)]
pub struct WritePlan {
    pub assignments: Vec<Assignment>,
    pub supplied_key: Option<Value>,
}

/// Filter `record` to writable, present columns and append audit stamps.
/// Fails when no caller field survives, so no malformed statement is emitted.
pub fn plan_assignments(
    table: &TableSpec,
    columns: &ColumnSet,
    record: DesiredRecord,
    mode: &WriteMode,
    actor: Option<&str>,
) -> Result<WritePlan, AppError> {
    let mut remaining: HashMap<String, Value> =
        record.into_iter().map(|(k, v)| (k.to_ascii_uppercase(), v)).collect();
    let mut assignments = Vec::new();
    let mut supplied_key = None;
    let mut absent = Vec::new();

    let is_insert = matches!(mode, WriteMode::Insert);
    if is_insert && !table.auto_increment {
        if let Some(v) = remaining.remove(table.primary_key) {
            if columns.contains(table.primary_key) {
                assignments.push(Assignment::param(table.primary_key, v.clone()));
                supplied_key = Some(v);
            }
        }
    }

    for &col in table.columns {
        let Some(v) = remaining.remove(col) else { continue };
        if columns.contains(col) {
            assignments.push(Assignment::param(col, v));
        } else {
            absent.push(col);
        }
    }

    let mut dropped: Vec<String> = remaining.into_keys().collect();
    dropped.extend(absent.iter().map(|c| c.to_string()));
    if !dropped.is_empty() {
        dropped.sort();
        tracing::info!(table = table.name, dropped = ?dropped, "dropping fields with no writable column");
    }

    if assignments.is_empty() {
        return Err(ConfigError::NoWritableColumns {
            table: table.name.to_string(),
        }
        .into());
    }

    for audit in table.audit {
        if !columns.contains(audit.name) || (!is_insert && audit.kind.on_insert_only()) {
            continue;
        }
        if audit.kind.is_timestamp() {
            assignments.push(Assignment::now(audit.name));
        } else if let Some(actor) = actor {
            assignments.push(Assignment::param(audit.name, Value::String(actor.to_string())));
        }
    }

    Ok(WritePlan {
        assignments,
        supplied_key,
    })
}

/// Name the guarded column in a uniqueness conflict when the index maps to one.
fn conflict_on_column(table: &TableSpec, e: AppError) -> AppError {
    match e {
        AppError::Conflict { field, message } => {
            let field = field.map(|key| table.unique_column_for_key(&key).map(str::to_string).unwrap_or(key));
            tracing::warn!(table = table.name, field = ?field, "uniqueness conflict");
            AppError::Conflict { field, message }
        }
        e => e,
    }
}
