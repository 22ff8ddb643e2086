use std::sync::Arc;

use log::{debug, info};

use crate::domain::entities::preferences::TablePreferences;
use crate::error::GridError;
use crate::usecase::ports::report::ErrorReporter;
use crate::usecase::ports::store::KeyValueStore;

pub const STORAGE_KEY_PREFIX: &str = "erp_table_preferences_";

pub fn storage_key(table_id: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}{table_id}")
}

/// Per-table layout persistence on top of a key-value store. Failures are
/// reported and swallowed: callers only ever see "saved or not" and
/// "preferences or none".
#[derive(Clone)]
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    reporter: Arc<dyn ErrorReporter>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn KeyValueStore>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { store, reporter }
    }

    pub fn save(&self, table_id: &str, preferences: &TablePreferences) -> bool {
        let encoded = match serde_json::to_string(preferences) {
            Ok(encoded) => encoded,
            Err(source) => {
                self.reporter.report(&GridError::PreferenceEncode {
                    table_id: table_id.to_string(),
                    source,
                });
                return false;
            }
        };

        match self.store.set(&storage_key(table_id), &encoded) {
            Ok(()) => {
                info!("table preferences saved for {table_id}");
                true
            }
            Err(source) => {
                self.reporter.report(&GridError::PreferenceWrite {
                    table_id: table_id.to_string(),
                    source,
                });
                false
            }
        }
    }

    pub fn load(&self, table_id: &str) -> Option<TablePreferences> {
        let raw = match self.store.get(&storage_key(table_id)) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no saved preferences for {table_id}");
                return None;
            }
            Err(source) => {
                self.reporter.report(&GridError::PreferenceRead {
                    table_id: table_id.to_string(),
                    source,
                });
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(preferences) => Some(preferences),
            Err(source) => {
                self.reporter.report(&GridError::PreferenceParse {
                    table_id: table_id.to_string(),
                    source,
                });
                None
            }
        }
    }

    pub fn clear(&self, table_id: &str) {
        match self.store.remove(&storage_key(table_id)) {
            Ok(()) => info!("table preferences cleared for {table_id}"),
            Err(source) => self.reporter.report(&GridError::PreferenceClear {
                table_id: table_id.to_string(),
                source,
            }),
        }
    }
}
