//! Presentation-to-storage coercion for request values.

use crate::error::AppError;
use serde_json::Value;

/// A 0/1 flag column (`IS_ACTIVE`, `IS_ENABLED`).
///
/// Accepts booleans, numbers (non-zero is on), strings (`"Active"`, `"true"`,
/// `"1"`, `"yes"`, `"enabled"` are on; any other label is off), and the
/// binary-encoded byte shape MySQL `BIT(1)` values take when echoed back by
/// clients (`{"type":"Buffer","data":[1]}` or `[1]`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flag(pub bool);

impl Flag {
    pub const ON: Flag = Flag(true);
    pub const OFF: Flag = Flag(false);

    /// `Ok(None)` for null: the caller decides the default.
    pub fn parse(field: &str, v: &Value) -> Result<Option<Flag>, AppError> {
        let on = match v {
            Value::Null => return Ok(None),
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Value::String(s) => {
                let s = s.trim();
                matches!(
                    s.to_ascii_lowercase().as_str(),
                    "active" | "true" | "1" | "yes" | "y" | "enabled" | "on"
                )
            }
            Value::Array(bytes) => bytes_on(field, bytes)?,
            Value::Object(obj) => match obj.get("data") {
                Some(Value::Array(bytes)) => bytes_on(field, bytes)?,
                _ => return Err(AppError::Validation(format!("{} must be a flag value", field))),
            },
        };
        Ok(Some(Flag(on)))
    }

    pub fn to_value(self) -> Value {
        Value::Number(u8::from(self.0).into())
    }
}

fn bytes_on(field: &str, bytes: &[Value]) -> Result<bool, AppError> {
    let mut on = false;
    for b in bytes {
        let n = b
            .as_u64()
            .filter(|n| *n <= u64::from(u8::MAX))
            .ok_or_else(|| AppError::Validation(format!("{} must be a flag value", field)))?;
        on |= n != 0;
    }
    Ok(on)
}

/// Replace `field` with its 0/1 storage form; when absent or null, store `default` if given.
pub fn coerce_flag(
    record: &mut std::collections::HashMap<String, Value>,
    field: &str,
    default: Option<Flag>,
) -> Result<(), AppError> {
    let parsed = match record.get(field) {
        Some(v) => Flag::parse(field, v)?,
        None => None,
    };
    match parsed.or(default) {
        Some(flag) => {
            record.insert(field.to_string(), flag.to_value());
        }
        None => {
            record.remove(field);
        }
    }
    Ok(())
}

/// Serialize JSON-shaped values (objects, arrays) to text; other values pass through.
pub fn coerce_json_text(record: &mut std::collections::HashMap<String, Value>, field: &str) {
    if let Some(v) = record.get_mut(field) {
        if v.is_object() || v.is_array() {
            *v = Value::String(v.to_string());
        }
    }
}

/// Parse an integer that may arrive as a JSON number or a numeric string.
pub fn coerce_integer(record: &mut std::collections::HashMap<String, Value>, field: &str) -> Result<(), AppError> {
    let Some(v) = record.get_mut(field) else {
        return Ok(());
    };
    match v {
        Value::Null => {}
        Value::Number(n) if n.is_i64() || n.is_u64() => {}
        Value::String(s) => {
            let n: i64 = s
                .trim()
                .parse()
                .map_err(|_| AppError::Validation(format!("{} must be an integer", field)))?;
            *v = Value::Number(n.into());
        }
        _ => return Err(AppError::Validation(format!("{} must be an integer", field))),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn flag(v: Value) -> Option<Flag> {
        Flag::parse("IS_ACTIVE", &v).unwrap()
    }

    #[test]
    fn labels_and_scalars() {
        assert_eq!(flag(json!("Active")), Some(Flag::ON));
        assert_eq!(flag(json!("Inactive")), Some(Flag::OFF));
        assert_eq!(flag(json!("anything else")), Some(Flag::OFF));
        assert_eq!(flag(json!(true)), Some(Flag::ON));
        assert_eq!(flag(json!(0)), Some(Flag::OFF));
        assert_eq!(flag(json!(2)), Some(Flag::ON));
        assert_eq!(flag(json!("1")), Some(Flag::ON));
        assert_eq!(flag(Value::Null), None);
    }

    #[test]
    fn binary_encoded_bytes() {
        assert_eq!(flag(json!({"type": "Buffer", "data": [1]})), Some(Flag::ON));
        assert_eq!(flag(json!({"type": "Buffer", "data": [0]})), Some(Flag::OFF));
        assert_eq!(flag(json!([1])), Some(Flag::ON));
        assert!(Flag::parse("IS_ACTIVE", &json!({"data": [300]})).is_err());
        assert!(Flag::parse("IS_ACTIVE", &json!({"x": 1})).is_err());
    }

    #[test]
    fn coerce_flag_applies_default() {
        let mut r: HashMap<String, Value> = HashMap::new();
        coerce_flag(&mut r, "IS_ENABLED", Some(Flag::ON)).unwrap();
        assert_eq!(r["IS_ENABLED"], json!(1));

        let mut r: HashMap<String, Value> = [("IS_ACTIVE".to_string(), json!("Active"))].into();
        coerce_flag(&mut r, "IS_ACTIVE", None).unwrap();
        assert_eq!(r["IS_ACTIVE"], json!(1));

        let mut r: HashMap<String, Value> = [("IS_ACTIVE".to_string(), Value::Null)].into();
        coerce_flag(&mut r, "IS_ACTIVE", None).unwrap();
        assert!(!r.contains_key("IS_ACTIVE"));
    }

    #[test]
    fn json_fields_become_text() {
        let mut r: HashMap<String, Value> = [("PREFERENCES".to_string(), json!({"a": 1}))].into();
        coerce_json_text(&mut r, "PREFERENCES");
        assert_eq!(r["PREFERENCES"], json!(r#"{"a":1}"#));
    }

    #[test]
    fn integers_from_strings() {
        let mut r: HashMap<String, Value> = [("ORGANIZATION_ID".to_string(), json!(" 12 "))].into();
        coerce_integer(&mut r, "ORGANIZATION_ID").unwrap();
        assert_eq!(r["ORGANIZATION_ID"], json!(12));
        let mut r: HashMap<String, Value> = [("ORGANIZATION_ID".to_string(), json!("abc"))].into();
        assert!(coerce_integer(&mut r, "ORGANIZATION_ID").is_err());
    }
}
