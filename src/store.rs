//! Data-store seam: query execution and live column introspection, with the MySQL implementation.

use crate::config::DatabaseSettings;
use crate::error::AppError;
use crate::sql::bind_all;
use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Either, Executor};
use std::collections::HashSet;
use std::str::FromStr;

/// Columns physically present in a table at the time of the call.
/// Names compare ASCII-case-insensitively, as MySQL does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnSet {
    names: HashSet<String>,
}

impl ColumnSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ColumnSet {
            names: names.into_iter().map(|n| n.as_ref().to_ascii_uppercase()).collect(),
        }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.names.contains(&column.to_ascii_uppercase())
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}

/// Outcome of a write statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: u64,
}

/// Everything the services need from a database. One instance per schema.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Live column names of `table`. Empty when the table does not exist.
    async fn list_columns(&self, table: &str) -> Result<ColumnSet, AppError>;

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult, AppError>;

    async fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<Value>, AppError>;

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError>;

    /// Rows of the first result set only. A `CALL` may return several; the rest are discarded.
    async fn fetch_first_result_set(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError> {
        self.fetch_all(sql, params).await
    }

    async fn ping(&self) -> Result<(), AppError>;

    /// Release connections. Default is a no-op for stores without a pool.
    async fn close(&self) {}
}

const LIST_COLUMNS_SQL: &str = "SELECT CAST(COLUMN_NAME AS CHAR) FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?";

/// Lazily connecting pool: no connection is opened until the first query.
pub fn connect_pool(url: &str, settings: &DatabaseSettings) -> Result<MySqlPool, AppError> {
    let options = MySqlConnectOptions::from_str(url)?.ssl_mode(settings.ssl_mode);
    Ok(MySqlPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_lazy_with(options))
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlStore { pool }
    }
}

#[async_trait]
impl TableStore for MySqlStore {
    async fn list_columns(&self, table: &str) -> Result<ColumnSet, AppError> {
        let names: Vec<String> = sqlx::query_scalar(LIST_COLUMNS_SQL)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)?;
        tracing::debug!(table, columns = names.len(), "introspected columns");
        Ok(ColumnSet::new(names))
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "execute");
        let result = bind_all(sqlx::query(sql), params)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_db)?;
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: result.last_insert_id(),
        })
    }

    async fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let row = bind_all(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "query");
        let rows = bind_all(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)?;
        Ok(rows.iter().map(row_to_json).collect())
    }

    async fn fetch_first_result_set(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %sql, params = ?params, "call");
        let mut stream = (&self.pool).fetch_many(bind_all(sqlx::query(sql), params));
        let mut rows = Vec::new();
        // Each result set ends with a status item.
        while let Some(step) = stream.try_next().await.map_err(AppError::from_db)? {
            match step {
                Either::Left(_) => break,
                Either::Right(row) => rows.push(row_to_json(&row)),
            }
        }
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn row_to_json(row: &MySqlRow) -> Value {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, col));
    }
    Value::Object(map)
}

fn cell_to_value(row: &MySqlRow, col: &sqlx::mysql::MySqlColumn) -> Value {
    use sqlx::{Column, Row, TypeInfo};
    let name = col.name();
    let type_name = col.type_info().name();

    if type_name == "JSON" {
        if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
            return j;
        }
    }
    if type_name == "BIT" {
        if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(name) {
            return Value::Number(bit_bytes_to_u64(&bytes).into());
        }
        if let Ok(Some(n)) = row.try_get::<Option<u64>, _>(name) {
            return Value::Number(n.into());
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<u64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(n)) = row.try_get::<Option<f32>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n as f64) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
        return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDate>, _>(name) {
        return Value::String(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(bytes)) = row.try_get::<Option<Vec<u8>>, _>(name) {
        return match String::from_utf8(bytes) {
            Ok(s) => Value::String(s),
            Err(e) => Value::Array(e.into_bytes().into_iter().map(|b| Value::Number(b.into())).collect()),
        };
    }
    Value::Null
}

/// Big-endian BIT(n) payload as an integer (BIT(1) flags arrive as a single byte).
fn bit_bytes_to_u64(bytes: &[u8]) -> u64 {
    bytes.iter().rev().take(8).rev().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
}
