//! Builds parameterized INSERT, SELECT, UPDATE, DELETE, and CALL statements for MySQL.
//! Identifiers come only from compile-time table specs; values are always `?` parameters.

use crate::config::TableSpec;
use serde_json::Value;

/// Quote identifier for MySQL (safe: only from table specs).
fn quoted(s: &str) -> String {
    format!("`{}`", s.replace('`', "``"))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> &'static str {
        self.params.push(v);
        "?"
    }
}

/// Right-hand side of one column assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Param(Value),
    /// Server clock (`NOW()`), never bound.
    Now,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: SqlValue,
}

impl Assignment {
    pub fn param(column: &'static str, v: Value) -> Self {
        Assignment {
            column,
            value: SqlValue::Param(v),
        }
    }

    pub fn now(column: &'static str) -> Self {
        Assignment {
            column,
            value: SqlValue::Now,
        }
    }
}

fn rhs(q: &mut QueryBuf, value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Param(v) => q.push_param(v.clone()),
        SqlValue::Now => "NOW()",
    }
}

/// INSERT INTO t (cols) VALUES (?, NOW(), ...). Caller guarantees `assignments` is non-empty.
pub fn insert(table: &TableSpec, assignments: &[Assignment]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::with_capacity(assignments.len());
    let mut placeholders = Vec::with_capacity(assignments.len());
    for a in assignments {
        cols.push(quoted(a.column));
        placeholders.push(rhs(&mut q, &a.value));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quoted(table.name),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// UPDATE t SET c = ?, ... WHERE pk = ?. The id is bound last.
pub fn update(table: &TableSpec, id: &Value, assignments: &[Assignment]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::with_capacity(assignments.len());
    for a in assignments {
        let r = rhs(&mut q, &a.value);
        sets.push(format!("{} = {}", quoted(a.column), r));
    }
    q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        quoted(table.name),
        sets.join(", "),
        quoted(table.primary_key)
    );
    q
}

/// SELECT * by primary key. Returns whatever columns the live table has.
pub fn select_by_id(table: &TableSpec, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id.clone());
    q.sql = format!(
        "SELECT * FROM {} WHERE {} = ?",
        quoted(table.name),
        quoted(table.primary_key)
    );
    q
}

/// SELECT list with exact-match filters, optional active-only restriction, ORDER BY pk, LIMIT/OFFSET.
pub fn select_list(
    table: &TableSpec,
    filters: &[(&'static str, Value)],
    active_only: bool,
    limit: u32,
    offset: u32,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    if active_only {
        if let Some(active) = table.active_column {
            where_parts.push(format!("{} = 1", quoted(active)));
        }
    }
    for (col, val) in filters {
        let ph = q.push_param(val.clone());
        where_parts.push(format!("{} = {}", quoted(col), ph));
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    q.sql = format!(
        "SELECT * FROM {}{} ORDER BY {} LIMIT {} OFFSET {}",
        quoted(table.name),
        where_clause,
        quoted(table.primary_key),
        limit.min(1000),
        offset
    );
    q
}

/// DELETE one row, only if its active flag is already 0.
pub fn delete_inactive_by_id(table: &TableSpec, active_column: &str, id: &Value) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(id.clone());
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ? AND {} = 0",
        quoted(table.name),
        quoted(table.primary_key),
        quoted(active_column)
    );
    q
}

/// DELETE every row whose active flag is 0.
pub fn delete_inactive(table: &TableSpec, active_column: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = 0",
        quoted(table.name),
        quoted(active_column)
    );
    q
}

/// CALL procedure(?, ?, ...).
pub fn call_procedure(procedure: &str, args: Vec<Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let placeholders: Vec<&str> = args.into_iter().map(|a| q.push_param(a)).collect();
    q.sql = format!("CALL {}({})", quoted(procedure), placeholders.join(", "));
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LOCATIONS, ORGANIZATIONS, PROVIDERS};
    use serde_json::json;

    #[test]
    fn insert_binds_params_and_inlines_now() {
        let q = insert(
            &ORGANIZATIONS,
            &[
                Assignment::param("ORGANIZATION_NAME", json!("Acme")),
                Assignment::param("IS_ACTIVE", json!(1)),
                Assignment::now("CREATED_AT"),
            ],
        );
        assert_eq!(
            q.sql,
            "INSERT INTO `organizations` (`ORGANIZATION_NAME`, `IS_ACTIVE`, `CREATED_AT`) VALUES (?, ?, NOW())"
        );
        assert_eq!(q.params, vec![json!("Acme"), json!(1)]);
    }

    #[test]
    fn update_binds_id_last() {
        let q = update(
            &PROVIDERS,
            &json!(7),
            &[Assignment::param("LAST_NAME", json!("Doe")), Assignment::now("UPDATED_AT")],
        );
        assert_eq!(
            q.sql,
            "UPDATE `providers` SET `LAST_NAME` = ?, `UPDATED_AT` = NOW() WHERE `PROVIDER_ID` = ?"
        );
        assert_eq!(q.params, vec![json!("Doe"), json!(7)]);
    }

    #[test]
    fn values_never_reach_sql_text() {
        let evil = "x'); DROP TABLE organizations; --";
        let q = insert(&ORGANIZATIONS, &[Assignment::param("ORGANIZATION_NAME", json!(evil))]);
        assert!(!q.sql.contains("DROP"));
        assert_eq!(q.params, vec![json!(evil)]);
    }

    #[test]
    fn list_with_filter_and_active() {
        let q = select_list(&LOCATIONS, &[("ORGANIZATION_ID", json!(3))], true, 5000, 10);
        assert_eq!(
            q.sql,
            "SELECT * FROM `locations` WHERE `IS_ACTIVE` = 1 AND `ORGANIZATION_ID` = ? ORDER BY `LOCATION_ID` LIMIT 1000 OFFSET 10"
        );
        assert_eq!(q.params, vec![json!(3)]);
    }

    #[test]
    fn list_including_inactive_has_no_where() {
        let q = select_list(&ORGANIZATIONS, &[], false, 100, 0);
        assert_eq!(
            q.sql,
            "SELECT * FROM `organizations` ORDER BY `ORGANIZATION_ID` LIMIT 100 OFFSET 0"
        );
    }

    #[test]
    fn hard_delete_requires_inactive() {
        let q = delete_inactive_by_id(&ORGANIZATIONS, "IS_ACTIVE", &json!(4));
        assert_eq!(
            q.sql,
            "DELETE FROM `organizations` WHERE `ORGANIZATION_ID` = ? AND `IS_ACTIVE` = 0"
        );
        let q = delete_inactive(&LOCATIONS, "IS_ACTIVE");
        assert_eq!(q.sql, "DELETE FROM `locations` WHERE `IS_ACTIVE` = 0");
        assert!(q.params.is_empty());
    }

    #[test]
    fn procedure_call_placeholders() {
        let q = call_procedure("CB_GET_CHATBOT_CLIENTS", vec![json!(1), Value::Null, json!("x")]);
        assert_eq!(q.sql, "CALL `CB_GET_CHATBOT_CLIENTS`(?, ?, ?)");
        assert_eq!(q.params.len(), 3);
    }

    #[test]
    fn backticks_in_identifiers_are_doubled() {
        assert_eq!(quoted("we`ird"), "`we``ird`");
    }
}
