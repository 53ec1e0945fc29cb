//! Case conversion for request keys: camelCase and snake_case -> UPPER_SNAKE column names.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Convert a single identifier to UPPER_SNAKE_CASE.
/// e.g. "organizationName" -> "ORGANIZATION_NAME", "zip_code" -> "ZIP_CODE", "addressLine1" -> "ADDRESS_LINE1".
/// Identifiers already in UPPER_SNAKE are returned unchanged.
pub fn to_upper_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c == '-' || c == ' ' {
            out.push('_');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = c.is_lowercase();
        out.extend(c.to_uppercase());
    }
    out
}

/// Convert all keys of a JSON object to UPPER_SNAKE. When two keys collide
/// (e.g. "firstName" and "FIRST_NAME"), the key already in column form wins.
pub fn object_keys_to_upper_snake(obj: Map<String, Value>) -> HashMap<String, Value> {
    let mut out: HashMap<String, Value> = HashMap::with_capacity(obj.len());
    let mut exact: Vec<String> = Vec::new();
    for (k, v) in obj {
        let upper = to_upper_snake_case(&k);
        let is_exact = upper == k;
        if is_exact {
            exact.push(upper.clone());
            out.insert(upper, v);
        } else if !exact.contains(&upper) {
            out.insert(upper, v);
        }
    }
    out
}
