//! Shared application state for all routes: one store per schema, plus settings.

use crate::config::{DatabaseSettings, Schema, Settings};
use crate::error::AppError;
use crate::service::RecordWriter;
use crate::store::{connect_pool, MySqlStore, TableStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct Stores {
    pub chatbot: Arc<dyn TableStore>,
    pub scribe: Arc<dyn TableStore>,
    pub evaa_config: Arc<dyn TableStore>,
}

impl Stores {
    /// One lazily connecting MySQL pool per schema.
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, AppError> {
        Ok(Stores {
            chatbot: Arc::new(MySqlStore::new(connect_pool(&settings.chatbot_url, settings)?)),
            scribe: Arc::new(MySqlStore::new(connect_pool(&settings.scribe_url, settings)?)),
            evaa_config: Arc::new(MySqlStore::new(connect_pool(&settings.evaa_config_url, settings)?)),
        })
    }

    pub fn get(&self, schema: Schema) -> &Arc<dyn TableStore> {
        match schema {
            Schema::Chatbot => &self.chatbot,
            Schema::Scribe => &self.scribe,
            Schema::EvaaConfig => &self.evaa_config,
        }
    }

    pub async fn close(&self) {
        for schema in Schema::ALL {
            self.get(schema).close().await;
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(stores: Stores, settings: Settings) -> Self {
        AppState {
            stores,
            settings: Arc::new(settings),
        }
    }

    pub fn store(&self, schema: Schema) -> &dyn TableStore {
        self.stores.get(schema).as_ref()
    }

    pub fn writer(&self, schema: Schema) -> RecordWriter {
        RecordWriter::new(self.stores.get(schema).clone(), self.settings.column_introspection)
    }
}
