//! Request validation from per-entity field rules.

use crate::error::AppError;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

/// Rules for one column of a request body.
#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub column: &'static str,
    pub required: bool,
    pub max_length: Option<usize>,
    pub pattern: Option<&'static str>,
    pub format: Option<Format>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
}

impl FieldRule {
    pub const fn optional(column: &'static str) -> Self {
        FieldRule {
            column,
            required: false,
            max_length: None,
            pattern: None,
            format: None,
        }
    }

    pub const fn required(column: &'static str) -> Self {
        FieldRule {
            required: true,
            ..FieldRule::optional(column)
        }
    }

    pub const fn max_length(self, n: usize) -> Self {
        FieldRule {
            max_length: Some(n),
            ..self
        }
    }

    pub const fn pattern(self, p: &'static str) -> Self {
        FieldRule {
            pattern: Some(p),
            ..self
        }
    }

    pub const fn format(self, f: Format) -> Self {
        FieldRule {
            format: Some(f),
            ..self
        }
    }
}

pub struct RequestValidator;

impl RequestValidator {
    /// Validate body for insert. All required fields must be present and non-blank.
    pub fn validate(body: &HashMap<String, Value>, rules: &[FieldRule]) -> Result<(), AppError> {
        for rule in rules {
            let val = body.get(rule.column);
            if rule.required && val.map(is_blank).unwrap_or(true) {
                return Err(AppError::Validation(format!("{} is required", rule.column)));
            }
            if let Some(v) = val {
                validate_field(rule, v)?;
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for PUT). A required field may be omitted but not blanked.
    pub fn validate_partial(body: &HashMap<String, Value>, rules: &[FieldRule]) -> Result<(), AppError> {
        for rule in rules {
            let Some(v) = body.get(rule.column) else { continue };
            if rule.required && is_blank(v) {
                return Err(AppError::Validation(format!("{} cannot be empty", rule.column)));
            }
            validate_field(rule, v)?;
        }
        Ok(())
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn validate_field(rule: &FieldRule, v: &Value) -> Result<(), AppError> {
    let col = rule.column;
    let Some(s) = v.as_str() else {
        return Ok(());
    };
    if let Some(max) = rule.max_length {
        if s.chars().count() > max {
            return Err(AppError::Validation(format!("{} must be at most {} characters", col, max)));
        }
    }
    if s.is_empty() {
        return Ok(());
    }
    if let Some(pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::Validation(format!("invalid pattern for {}", col)))?;
        if !re.is_match(s) {
            return Err(AppError::Validation(format!("{} does not match required pattern", col)));
        }
    }
    if let Some(Format::Email) = rule.format {
        if !s.contains('@') || s.len() < 3 {
            return Err(AppError::Validation(format!("{} must be a valid email", col)));
        }
    }
    Ok(())
}
