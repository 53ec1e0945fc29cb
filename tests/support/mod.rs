//! In-memory TableStore for integration tests. Interprets the statements produced by the SQL builder.

#![allow(dead_code)]

use async_trait::async_trait;
use regex::Regex;
use scribe_config_api::{AppError, AppState, ColumnSet, ExecResult, Settings, Stores, TableStore};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub struct MemTable {
    pub columns: Vec<String>,
    pub primary_key: String,
    pub unique: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub next_id: u64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, MemTable>>,
    /// Procedure name -> result sets, in the order the server would return them.
    procedures: Mutex<HashMap<String, Vec<Vec<Value>>>>,
    pub column_fetches: Mutex<usize>,
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
    pub statements: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, primary_key: &str, columns: &[&str], unique: &[&str]) -> Self {
        self.tables.lock().unwrap().insert(
            name.to_string(),
            MemTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                primary_key: primary_key.to_string(),
                unique: unique.iter().map(|c| c.to_string()).collect(),
                rows: Vec::new(),
                next_id: 1,
            },
        );
        self
    }

    pub fn with_procedure(self, name: &str, result_sets: Vec<Vec<Value>>) -> Self {
        self.procedures.lock().unwrap().insert(name.to_string(), result_sets);
        self
    }

    /// Simulate `ALTER TABLE ... DROP COLUMN` between requests.
    pub fn drop_column(&self, table: &str, column: &str) {
        let mut tables = self.tables.lock().unwrap();
        let t = tables.get_mut(table).expect("table");
        t.columns.retain(|c| c != column);
        for row in &mut t.rows {
            row.remove(column);
        }
    }

    pub fn last_statement(&self) -> String {
        self.statements.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn record_call(&self, sql: &str, params: &[Value]) -> Option<Vec<Vec<Value>>> {
        let call = Regex::new(r"^CALL `(\w+)`\(.*\)$").unwrap();
        let c = call.captures(sql)?;
        self.calls.lock().unwrap().push((c[1].to_string(), params.to_vec()));
        Some(self.procedures.lock().unwrap().get(&c[1]).cloned().unwrap_or_default())
    }

    pub fn rows(&self, table: &str) -> Vec<Map<String, Value>> {
        self.tables.lock().unwrap()[table].rows.clone()
    }

    /// Insert a row directly, bypassing the writer. Returns its generated id.
    pub fn seed(&self, table: &str, values: Value) -> u64 {
        let mut tables = self.tables.lock().unwrap();
        let t = tables.get_mut(table).expect("table");
        let id = t.next_id;
        t.next_id += 1;
        let mut row: Map<String, Value> = t.columns.iter().map(|c| (c.clone(), Value::Null)).collect();
        row.insert(t.primary_key.clone(), Value::from(id));
        if let Value::Object(m) = values {
            for (k, v) in m {
                if row.contains_key(&k) {
                    row.insert(k, v);
                }
            }
        }
        t.rows.push(row);
        id
    }
}

fn now() -> Value {
    Value::String(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn ident(s: &str) -> String {
    s.trim().trim_matches('`').to_string()
}

/// Parse "`COL` = ?" / "`COL` = NOW()" / "`COL` = 0" into (column, rhs).
fn split_assignment(s: &str) -> (String, String) {
    let (l, r) = s.split_once(" = ").expect("assignment");
    (ident(l), r.trim().to_string())
}

fn rhs_value(rhs: &str, params: &mut std::slice::Iter<'_, Value>) -> Value {
    match rhs {
        "?" => params.next().cloned().unwrap_or(Value::Null),
        "NOW()" => now(),
        lit => lit.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::String(lit.to_string())),
    }
}

fn matches_conditions(row: &Map<String, Value>, conds: &[(String, Value)]) -> bool {
    conds.iter().all(|(c, v)| row.get(c) == Some(v))
}

fn parse_where(clause: &str, params: &mut std::slice::Iter<'_, Value>) -> Vec<(String, Value)> {
    clause
        .split(" AND ")
        .map(|part| {
            let (col, rhs) = split_assignment(part);
            (col, rhs_value(&rhs, params))
        })
        .collect()
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn list_columns(&self, table: &str) -> Result<ColumnSet, AppError> {
        *self.column_fetches.lock().unwrap() += 1;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .map(|t| ColumnSet::new(t.columns.iter()))
            .unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult, AppError> {
        self.statements.lock().unwrap().push(sql.to_string());
        let mut params = params.iter();
        let mut tables = self.tables.lock().unwrap();

        let insert = Regex::new(r"^INSERT INTO `(\w+)` \((.*)\) VALUES \((.*)\)$").unwrap();
        let update = Regex::new(r"^UPDATE `(\w+)` SET (.*) WHERE (.*)$").unwrap();
        let delete = Regex::new(r"^DELETE FROM `(\w+)` WHERE (.*)$").unwrap();

        if let Some(c) = insert.captures(sql) {
            let t = tables.get_mut(&c[1]).expect("table");
            let cols: Vec<String> = c[2].split(", ").map(ident).collect();
            let vals: Vec<Value> = c[3].split(", ").map(|r| rhs_value(r.trim(), &mut params)).collect();
            for (col, val) in cols.iter().zip(&vals) {
                assert!(t.columns.contains(col), "unknown column {} in {}", col, sql);
                if t.unique.contains(col) && !val.is_null() && t.rows.iter().any(|r| r.get(col) == Some(val)) {
                    let message = format!("Duplicate entry '{}' for key '{}.{}'", val, &c[1], col);
                    return Err(AppError::Conflict {
                        field: scribe_config_api::error::duplicate_key_name(&message),
                        message,
                    });
                }
            }
            let id = t.next_id;
            t.next_id += 1;
            let mut row: Map<String, Value> = t.columns.iter().map(|c| (c.clone(), Value::Null)).collect();
            row.insert(t.primary_key.clone(), Value::from(id));
            for (col, val) in cols.into_iter().zip(vals) {
                row.insert(col, val);
            }
            t.rows.push(row);
            return Ok(ExecResult {
                rows_affected: 1,
                last_insert_id: id,
            });
        }

        if let Some(c) = update.captures(sql) {
            let t = tables.get_mut(&c[1]).expect("table");
            let sets: Vec<(String, Value)> = c[2]
                .split(", ")
                .map(|s| {
                    let (col, rhs) = split_assignment(s);
                    (col, rhs_value(&rhs, &mut params))
                })
                .collect();
            let conds = parse_where(&c[3], &mut params);
            let mut affected = 0;
            for row in t.rows.iter_mut().filter(|r| matches_conditions(r, &conds)) {
                for (col, val) in &sets {
                    assert!(row.contains_key(col), "unknown column {} in {}", col, sql);
                    row.insert(col.clone(), val.clone());
                }
                affected += 1;
            }
            return Ok(ExecResult {
                rows_affected: affected,
                last_insert_id: 0,
            });
        }

        if let Some(c) = delete.captures(sql) {
            let t = tables.get_mut(&c[1]).expect("table");
            let conds = parse_where(&c[2], &mut params);
            let before = t.rows.len();
            t.rows.retain(|r| !matches_conditions(r, &conds));
            return Ok(ExecResult {
                rows_affected: (before - t.rows.len()) as u64,
                last_insert_id: 0,
            });
        }

        panic!("unsupported statement: {}", sql);
    }

    async fn fetch_optional(&self, sql: &str, params: &[Value]) -> Result<Option<Value>, AppError> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError> {
        self.statements.lock().unwrap().push(sql.to_string());
        if let Some(sets) = self.record_call(sql, params) {
            return Ok(sets.into_iter().flatten().collect());
        }

        let select =
            Regex::new(r"^SELECT \* FROM `(\w+)`(?: WHERE (.*?))?(?: ORDER BY `\w+`)?(?: LIMIT (\d+) OFFSET (\d+))?$")
                .unwrap();
        let c = select.captures(sql).unwrap_or_else(|| panic!("unsupported query: {}", sql));
        let mut params = params.iter();
        let conds = c.get(2).map(|w| parse_where(w.as_str(), &mut params)).unwrap_or_default();
        let limit = c.get(3).map(|m| m.as_str().parse::<usize>().unwrap()).unwrap_or(usize::MAX);
        let offset = c.get(4).map(|m| m.as_str().parse::<usize>().unwrap()).unwrap_or(0);
        let tables = self.tables.lock().unwrap();
        let t = tables.get(&c[1]).expect("table");
        Ok(t.rows
            .iter()
            .filter(|r| matches_conditions(r, &conds))
            .skip(offset)
            .take(limit)
            .map(|r| Value::Object(r.clone()))
            .collect())
    }

    async fn fetch_first_result_set(&self, sql: &str, params: &[Value]) -> Result<Vec<Value>, AppError> {
        self.statements.lock().unwrap().push(sql.to_string());
        match self.record_call(sql, params) {
            Some(sets) => Ok(sets.into_iter().next().unwrap_or_default()),
            None => self.fetch_all(sql, params).await,
        }
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

pub const ORG_COLUMNS: &[&str] = &[
    "ORGANIZATION_ID",
    "ORGANIZATION_NAME",
    "ACCOUNT_ID",
    "IS_ACTIVE",
    "CREATED_AT",
    "UPDATED_AT",
    "CREATED_BY",
    "UPDATED_BY",
];

pub const PROVIDER_COLUMNS: &[&str] = &[
    "PROVIDER_ID",
    "ORGANIZATION_ID",
    "FIRST_NAME",
    "LAST_NAME",
    "SPECIALTY",
    "NPI",
    "IS_ACTIVE",
    "IS_ENABLED",
    "CREATED_AT",
    "UPDATED_AT",
];

pub const LOCATION_COLUMNS: &[&str] = &[
    "LOCATION_ID",
    "ORGANIZATION_ID",
    "LOCATION_NAME",
    "CITY",
    "ZIP_CODE",
    "IS_ACTIVE",
    "CREATED_AT",
    "UPDATED_AT",
];

/// Stores shaped like a deployment whose organizations table has no CONNECTION_STRING column.
pub struct Fixture {
    pub chatbot: Arc<MemoryStore>,
    pub scribe: Arc<MemoryStore>,
    pub evaa: Arc<MemoryStore>,
    pub state: AppState,
}

pub fn fixture() -> Fixture {
    let chatbot = Arc::new(MemoryStore::new().with_procedure(
        "CB_GET_CHATBOT_CLIENTS",
        vec![
            vec![serde_json::json!({"CLIENT_ID": 5, "CLIENT_NAME": "Acme Bot"})],
            vec![serde_json::json!({"TOTAL": 1})],
        ],
    ));
    let scribe = Arc::new(MemoryStore::new().with_table("providers", "PROVIDER_ID", PROVIDER_COLUMNS, &["NPI"]));
    let evaa = Arc::new(
        MemoryStore::new()
            .with_table("organizations", "ORGANIZATION_ID", ORG_COLUMNS, &["ACCOUNT_ID"])
            .with_table("locations", "LOCATION_ID", LOCATION_COLUMNS, &[]),
    );
    let stores = Stores {
        chatbot: chatbot.clone(),
        scribe: scribe.clone(),
        evaa_config: evaa.clone(),
    };
    let state = AppState::new(stores, Settings::default());
    Fixture {
        chatbot,
        scribe,
        evaa,
        state,
    }
}
