//! HTTP handlers for entity CRUD and chatbot clients.

pub mod clients;
pub mod entity;
pub use clients::*;
pub use entity::{locations, organizations, providers};
