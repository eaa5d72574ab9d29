//! Persistence of thresholds, connection profiles and the hierarchy
//!
//! The core only relies on the [`ConfigStore`] trait; [`JsonConfigStore`]
//! keeps each document as a pretty-printed JSON file in one directory.

pub mod connection;
pub mod json;

pub use connection::ConnectionConfig;
pub use json::JsonConfigStore;

use std::collections::HashMap;

use crate::alerts::ThresholdConfig;
use crate::hierarchy::{HierarchyError, HierarchyNode, HierarchyStore};

/// Storage for everything the operator configures
pub trait ConfigStore: Send + Sync {
    /// Threshold document keyed by queue name (empty when none saved)
    fn load_thresholds(&self) -> Result<HashMap<String, ThresholdConfig>, StoreError>;

    fn save_thresholds(&self, thresholds: &HashMap<String, ThresholdConfig>) -> Result<(), StoreError>;

    /// Saved connection profiles (empty when none saved)
    fn load_connections(&self) -> Result<Vec<ConnectionConfig>, StoreError>;

    /// Saved hierarchy, or None if nothing was saved yet
    fn load_hierarchy(&self) -> Result<Option<HierarchyStore>, StoreError>;

    fn save_hierarchy(&self, hierarchy: &HierarchyStore) -> Result<(), StoreError>;

    /// Insert or replace one queue's thresholds, keyed and named by `queue_name`
    fn save_threshold(&self, queue_name: &str, mut threshold: ThresholdConfig) -> Result<(), StoreError> {
        threshold.queue_name = queue_name.to_string();
        let mut thresholds = self.load_thresholds()?;
        thresholds.insert(queue_name.to_string(), threshold);
        self.save_thresholds(&thresholds)
    }

    /// Saved thresholds for a queue, or the defaults
    fn get_threshold(&self, queue_name: &str) -> Result<ThresholdConfig, StoreError> {
        Ok(self
            .load_thresholds()?
            .remove(queue_name)
            .unwrap_or_else(|| ThresholdConfig::new(queue_name)))
    }

    /// Flat hierarchy with one browser reference per connection at root level
    fn create_default_hierarchy(&self, connections: &[ConnectionConfig]) -> HierarchyStore {
        let mut hierarchy = HierarchyStore::new();

        for connection in connections {
            let node = HierarchyNode::browser(connection.display_name(), connection.name.clone());
            hierarchy.add_node(node, None);
        }

        tracing::info!(
            connections = connections.len(),
            "Created default hierarchy"
        );
        hierarchy
    }
}

/// Config store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error in {file}: {message}")]
    Deserialization { file: String, message: String },

    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(#[from] HierarchyError),
}
