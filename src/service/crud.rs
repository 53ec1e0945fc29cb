//! Static-shape reads, hard deletes, and stored-procedure calls.

use crate::config::TableSpec;
use crate::error::AppError;
use crate::sql::{call_procedure, delete_inactive, delete_inactive_by_id, select_by_id, select_list};
use crate::store::TableStore;
use serde_json::Value;

pub struct CrudService;

impl CrudService {
    /// List rows with optional filters (exact match), limit (default 100, max 1000), offset (default 0).
    /// Inactive rows are hidden unless `include_inactive`.
    pub async fn list(
        store: &dyn TableStore,
        table: &TableSpec,
        filters: &[(&'static str, Value)],
        include_inactive: bool,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        const DEFAULT_LIMIT: u32 = 100;
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(1000);
        let offset = offset.unwrap_or(0);
        let q = select_list(table, filters, !include_inactive, limit, offset);
        store.fetch_all(&q.sql, &q.params).await
    }

    /// Fetch one row by primary key.
    pub async fn read(store: &dyn TableStore, table: &TableSpec, id: &Value) -> Result<Option<Value>, AppError> {
        let q = select_by_id(table, id);
        store.fetch_optional(&q.sql, &q.params).await
    }

    /// Permanently delete one row that is already inactive.
    /// Not found when the id does not exist; conflict when the row is still active.
    pub async fn purge_one(store: &dyn TableStore, table: &TableSpec, id: &Value) -> Result<(), AppError> {
        let active = active_column(table)?;
        let q = delete_inactive_by_id(table, active, id);
        let result = store.execute(&q.sql, &q.params).await?;
        if result.rows_affected > 0 {
            tracing::info!(table = table.name, id = %id, "permanently deleted row");
            return Ok(());
        }
        match Self::read(store, table, id).await? {
            None => Err(AppError::NotFound(format!("{} {} not found", table.name, id))),
            Some(_) => Err(AppError::StillActive {
                field: active.to_string(),
                message: format!("{} {} is still active; deactivate it first", table.name, id),
            }),
        }
    }

    /// Permanently delete every inactive row. Returns the number removed.
    pub async fn purge_inactive(store: &dyn TableStore, table: &TableSpec) -> Result<u64, AppError> {
        let active = active_column(table)?;
        let q = delete_inactive(table, active);
        let result = store.execute(&q.sql, &q.params).await?;
        tracing::info!(table = table.name, deleted = result.rows_affected, "purged inactive rows");
        Ok(result.rows_affected)
    }

    /// CALL a stored procedure and return the rows of its first result set.
    pub async fn call(store: &dyn TableStore, procedure: &str, args: Vec<Value>) -> Result<Vec<Value>, AppError> {
        let q = call_procedure(procedure, args);
        store.fetch_first_result_set(&q.sql, &q.params).await
    }
}

fn active_column(table: &TableSpec) -> Result<&'static str, AppError> {
    table
        .active_column
        .ok_or_else(|| AppError::BadRequest(format!("{} has no active flag", table.name)))
}
