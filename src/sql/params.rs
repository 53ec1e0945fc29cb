//! Convert serde_json::Value to types that sqlx can bind for MySQL.

use serde_json::Value;
use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;

/// A value that can be bound to a MySQL query. Converts from serde_json::Value.
#[derive(Clone, Debug, PartialEq)]
pub enum MySqlBindValue {
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    String(String),
}

impl MySqlBindValue {
    /// Arrays and objects are bound as their JSON text.
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => MySqlBindValue::Null,
            Value::Bool(b) => MySqlBindValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MySqlBindValue::I64(i)
                } else if let Some(u) = n.as_u64() {
                    MySqlBindValue::U64(u)
                } else {
                    MySqlBindValue::F64(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => MySqlBindValue::String(s.clone()),
            Value::Array(_) | Value::Object(_) => MySqlBindValue::String(v.to_string()),
        }
    }

    pub fn bind_to<'q>(self, query: Query<'q, MySql, MySqlArguments>) -> Query<'q, MySql, MySqlArguments> {
        match self {
            MySqlBindValue::Null => query.bind(Option::<String>::None),
            MySqlBindValue::Bool(b) => query.bind(b),
            MySqlBindValue::I64(n) => query.bind(n),
            MySqlBindValue::U64(n) => query.bind(n),
            MySqlBindValue::F64(n) => query.bind(n),
            MySqlBindValue::String(s) => query.bind(s),
        }
    }
}

/// Bind every parameter in order.
pub fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    params: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for p in params {
        query = MySqlBindValue::from_json(p).bind_to(query);
    }
    query
}
