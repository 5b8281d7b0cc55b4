//! Persisted screen position of the navigation panel.
//!
//! Only the record lives here; the panel itself belongs to the host UI.

use crate::errors::StorageError;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default storage key for the panel position.
pub const DEFAULT_POSITION_KEY: &str = "gavel.panel_position";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelPosition {
    pub x: f64,
    pub y: f64,
}

impl PanelPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Stored position, or the origin when nothing usable is stored.
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Self {
        match store.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(key, error = %e, "Stored panel position is corrupt; using default");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(key, error = %e, "Failed to read panel position; using default");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(self).map_err(|e| StorageError::Other(anyhow::Error::new(e)))?;
        store.set(key, &json)
    }
}
