//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },
    #[error("table {table}: {message}")]
    InvalidTable { table: &'static str, message: String },
    #[error("no writable columns for table {table}")]
    NoWritableColumns { table: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{message}")]
    Conflict {
        field: Option<String>,
        message: String,
    },
    /// Row exists but its active flag blocks the operation.
    #[error("{message}")]
    StillActive { field: String, message: String },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a driver error: unique and foreign-key violations become caller-facing errors.
    pub fn from_db(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let message = db.message().to_string();
                return AppError::Conflict {
                    field: duplicate_key_name(&message),
                    message,
                };
            }
            if db.is_foreign_key_violation() {
                return AppError::Validation(format!("referenced record does not exist: {}", db.message()));
            }
        }
        AppError::Db(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::BadRequest(rejection.body_text())
        }
    }
}

/// Key name from a MySQL duplicate-entry message, with any `table.` prefix removed.
/// e.g. "Duplicate entry 'A1' for key 'organizations.ACCOUNT_ID'" -> "ACCOUNT_ID"
pub fn duplicate_key_name(message: &str) -> Option<String> {
    static DUPLICATE_KEY: OnceLock<Option<Regex>> = OnceLock::new();
    let re = DUPLICATE_KEY
        .get_or_init(|| Regex::new(r"for key '([^']+)'").ok())
        .as_ref()?;
    let key = re.captures(message)?.get(1)?.as_str();
    let key = key.rsplit('.').next().unwrap_or(key);
    Some(key.to_string())
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Config(ConfigError::NoWritableColumns { table }) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: format!("No writable fields supplied for {}", table),
                    details: None,
                    field: None,
                },
            ),
            AppError::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Server configuration error".into(),
                    details: Some(e.to_string()),
                    field: None,
                },
            ),
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: message,
                    details: None,
                    field: None,
                },
            ),
            AppError::Validation(message) | AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    details: None,
                    field: None,
                },
            ),
            AppError::Conflict { field, message } => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: match &field {
                        Some(f) => format!("Duplicate value for {}", f),
                        None => "Duplicate value".into(),
                    },
                    details: Some(message),
                    field,
                },
            ),
            AppError::PayloadTooLarge(message) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    error: "Request body too large".into(),
                    details: Some(message),
                    field: None,
                },
            ),
            AppError::StillActive { field, message } => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: message,
                    details: None,
                    field: Some(field),
                },
            ),
            AppError::Db(e) => {
                tracing::error!(error = %e, "database operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Database operation failed".into(),
                        details: Some(e.to_string()),
                        field: None,
                    },
                )
            }
            AppError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "Internal server error".into(),
                        details: Some(message),
                        field: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
