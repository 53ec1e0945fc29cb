//! Scribe config API: REST backend over the chatbot, scribe, and EVAA configuration schemas.

pub mod case;
pub mod coerce;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod records;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{validate_tables, Schema, Settings, TableSpec, ALL_TABLES};
pub use error::{AppError, ConfigError};
pub use routes::{app, client_routes, common_routes, entity_routes};
pub use service::{CrudService, RecordWriter, WriteMode};
pub use state::{AppState, Stores};
pub use store::{ColumnSet, ExecResult, MySqlStore, TableStore};
