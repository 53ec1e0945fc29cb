//! Startup validation of the table allow-lists.

use crate::config::tables::TableSpec;
use crate::error::ConfigError;
use std::collections::HashSet;

fn invalid(table: &TableSpec, message: String) -> ConfigError {
    ConfigError::InvalidTable {
        table: table.name,
        message,
    }
}

/// Check one table description for internal consistency.
pub fn validate_table(table: &TableSpec) -> Result<(), ConfigError> {
    if table.columns.is_empty() {
        return Err(invalid(table, "no writable columns".into()));
    }
    let mut seen = HashSet::new();
    for c in table.columns {
        if !seen.insert(c.to_ascii_uppercase()) {
            return Err(invalid(table, format!("duplicate column {}", c)));
        }
        if table.is_audit(c) {
            return Err(invalid(table, format!("audit column {} is listed as writable", c)));
        }
    }
    if table.auto_increment && table.is_writable(table.primary_key) {
        return Err(invalid(
            table,
            format!("auto-generated key {} is listed as writable", table.primary_key),
        ));
    }
    if table.is_audit(table.primary_key) {
        return Err(invalid(table, "primary key is an audit column".into()));
    }
    if let Some(active) = table.active_column {
        if !table.is_writable(active) {
            return Err(invalid(table, format!("active column {} is not writable", active)));
        }
    }
    for u in table.unique_columns {
        if !table.is_writable(u) {
            return Err(invalid(table, format!("unique column {} is not writable", u)));
        }
    }
    Ok(())
}

pub fn validate_tables(tables: &[&TableSpec]) -> Result<(), ConfigError> {
    for t in tables {
        validate_table(t)?;
    }
    Ok(())
}
