//! JSON file config store

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ConfigStore, ConnectionConfig, StoreError};
use crate::alerts::ThresholdConfig;
use crate::hierarchy::HierarchyStore;

pub const CONNECTIONS_FILE: &str = "connections.json";
pub const THRESHOLDS_FILE: &str = "thresholds.json";
pub const HIERARCHY_FILE: &str = "hierarchy.json";
pub const HIERARCHY_BACKUP_FILE: &str = "hierarchy.json.bak";

/// Stores each document as a pretty-printed JSON file under one directory
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    dir: PathBuf,
}

impl JsonConfigStore {
    /// Open a store, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            tracing::info!(dir = %dir.display(), "Created config directory");
        }
        Ok(Self { dir })
    }

    /// Directory holding the JSON documents
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(None);
        }

        let data = fs::read(&path)?;
        let value = serde_json::from_slice(&data).map_err(|e| StoreError::Deserialization {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        Ok(Some(value))
    }

    /// Writes land in a temp file first and are renamed into place
    fn write<T: Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(value)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = self.path(&format!("{}.tmp", file));
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, self.path(file))?;
        Ok(())
    }

    /// Replace the saved connection list
    pub fn save_connections(&self, connections: &[ConnectionConfig]) -> Result<(), StoreError> {
        self.write(CONNECTIONS_FILE, connections)?;
        tracing::info!(count = connections.len(), "Saved connections");
        Ok(())
    }
}

impl ConfigStore for JsonConfigStore {
    fn load_thresholds(&self) -> Result<HashMap<String, ThresholdConfig>, StoreError> {
        let thresholds: HashMap<String, ThresholdConfig> =
            self.read(THRESHOLDS_FILE)?.unwrap_or_default();
        tracing::debug!(count = thresholds.len(), "Loaded thresholds");
        Ok(thresholds)
    }

    fn save_thresholds(&self, thresholds: &HashMap<String, ThresholdConfig>) -> Result<(), StoreError> {
        self.write(THRESHOLDS_FILE, thresholds)?;
        tracing::info!(count = thresholds.len(), "Saved thresholds");
        Ok(())
    }

    fn load_connections(&self) -> Result<Vec<ConnectionConfig>, StoreError> {
        let connections: Vec<ConnectionConfig> = self.read(CONNECTIONS_FILE)?.unwrap_or_default();
        tracing::info!(count = connections.len(), "Loaded connections");
        Ok(connections)
    }

    fn load_hierarchy(&self) -> Result<Option<HierarchyStore>, StoreError> {
        let Some(hierarchy) = self.read::<HierarchyStore>(HIERARCHY_FILE)? else {
            tracing::info!("No hierarchy file found");
            return Ok(None);
        };

        hierarchy.validate()?;
        tracing::info!(nodes = hierarchy.len(), "Loaded hierarchy");
        Ok(Some(hierarchy))
    }

    fn save_hierarchy(&self, hierarchy: &HierarchyStore) -> Result<(), StoreError> {
        let path = self.path(HIERARCHY_FILE);
        if path.exists() {
            if let Err(e) = fs::copy(&path, self.path(HIERARCHY_BACKUP_FILE)) {
                tracing::warn!(error = %e, "Failed to back up hierarchy file");
            }
        }

        self.write(HIERARCHY_FILE, hierarchy)?;
        tracing::info!(nodes = hierarchy.len(), "Saved hierarchy");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::HierarchyNode;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonConfigStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonConfigStore::new(temp_dir.path().join("config")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_missing_files_are_empty() {
        let (_dir, store) = store();
        assert!(store.load_thresholds().unwrap().is_empty());
        assert!(store.load_connections().unwrap().is_empty());
        assert!(store.load_hierarchy().unwrap().is_none());
        assert!(store.dir().exists());
    }

    #[test]
    fn test_thresholds_persist() {
        let (_dir, store) = store();
        store
            .save_threshold("Q1", ThresholdConfig::new("Q1").with_absolute(100, 200))
            .unwrap();
        store.save_threshold("Q2", ThresholdConfig::new("Q2")).unwrap();

        let loaded = store.load_thresholds().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(store.get_threshold("Q1").unwrap().critical_threshold, 200);
        assert_eq!(store.get_threshold("Q3").unwrap(), ThresholdConfig::new("Q3"));
    }

    #[test]
    fn test_saved_threshold_takes_key_name() {
        let (_dir, store) = store();
        store
            .save_threshold("ORDERS.IN", ThresholdConfig::default().with_percentages(50, 80))
            .unwrap();

        let loaded = store.load_thresholds().unwrap();
        let config = &loaded["ORDERS.IN"];
        assert_eq!(config.queue_name, "ORDERS.IN");
        assert_eq!(config.warning_threshold, 50);
    }

    #[test]
    fn test_hierarchy_save_keeps_backup() {
        let (_dir, store) = store();
        let mut hierarchy = HierarchyStore::new();
        let folder = hierarchy.add_node(HierarchyNode::folder("Prod"), None);
        hierarchy.add_node(HierarchyNode::browser("QM1", "qm1"), Some(folder.as_str()));

        store.save_hierarchy(&hierarchy).unwrap();
        assert!(!store.path(HIERARCHY_BACKUP_FILE).exists());

        hierarchy.remove_node(&folder);
        store.save_hierarchy(&hierarchy).unwrap();
        assert!(store.path(HIERARCHY_BACKUP_FILE).exists());

        let loaded = store.load_hierarchy().unwrap().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_hierarchy_round_trip() {
        let (_dir, store) = store();
        let mut hierarchy = HierarchyStore::new();
        let folder = hierarchy.add_node(HierarchyNode::folder("Prod"), None);
        let leaf = hierarchy.add_node(HierarchyNode::browser("QM1", "qm1"), Some(folder.as_str()));
        hierarchy.select_node(Some(leaf.as_str()));

        store.save_hierarchy(&hierarchy).unwrap();
        let loaded = store.load_hierarchy().unwrap().unwrap();
        assert_eq!(loaded, hierarchy);
        assert_eq!(loaded.path(&leaf), vec!["Prod", "QM1"]);
    }

    #[test]
    fn test_corrupt_hierarchy_is_rejected() {
        let (_dir, store) = store();
        fs::write(
            store.path(HIERARCHY_FILE),
            r#"{"nodes":{},"rootNodeIds":["ghost"],"selectedNodeId":null}"#,
        )
        .unwrap();
        assert!(matches!(
            store.load_hierarchy(),
            Err(StoreError::InvalidHierarchy(_))
        ));

        fs::write(store.path(HIERARCHY_FILE), "not json").unwrap();
        assert!(matches!(
            store.load_hierarchy(),
            Err(StoreError::Deserialization { .. })
        ));
    }

    #[test]
    fn test_default_hierarchy_from_connections() {
        let (_dir, store) = store();
        let connections = vec![
            ConnectionConfig::new("Prod QM", "mq1", 1414, "SVRCONN", "QM1"),
            ConnectionConfig::new("", "mq2", 1414, "SVRCONN", "QM2"),
        ];
        store.save_connections(&connections).unwrap();

        let loaded = store.load_connections().unwrap();
        let hierarchy = store.create_default_hierarchy(&loaded);

        let roots = hierarchy.get_children(None);
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].name, "Prod QM");
        assert_eq!(roots[0].connection_config_id.as_deref(), Some("Prod QM"));
        assert_eq!(roots[1].name, "QM2@mq2");
        assert!(roots.iter().all(|n| n.is_browser_reference()));
        hierarchy.validate().unwrap();
    }
}
