//! Services: column-filtered writes, static reads and deletes, request validation.

mod crud;
mod validation;
mod writer;
pub use crud::CrudService;
pub use validation::{FieldRule, Format, RequestValidator};
pub use writer::{plan_assignments, DesiredRecord, Persisted, RecordWriter, WriteMode, WritePlan};
