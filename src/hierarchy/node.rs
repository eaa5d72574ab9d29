use serde::{Deserialize, Serialize};

/// Kind of entry in the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// Pure grouping node
    Folder,
    /// Leaf pointing at a queue browser connection
    BrowserReference,
}

/// Node in the hierarchy tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyNode {
    /// Unique node ID
    pub id: String,
    /// Node kind
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Display name
    pub name: String,
    /// Connection profile this leaf browses (None for folders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_config_id: Option<String>,
    /// Parent node ID (None for root nodes)
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Ordered child IDs
    #[serde(default)]
    pub child_ids: Vec<String>,
    /// Tree expansion state
    #[serde(default)]
    pub expanded: bool,
}

impl HierarchyNode {
    fn with_type(node_type: NodeType, name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            node_type,
            name: name.into(),
            connection_config_id: None,
            parent_id: None,
            child_ids: Vec::new(),
            expanded: false,
        }
    }

    /// Create a folder with a fresh ID
    pub fn folder(name: impl Into<String>) -> Self {
        Self::with_type(NodeType::Folder, name)
    }

    /// Create a browser reference with a fresh ID
    pub fn browser(name: impl Into<String>, connection_config_id: impl Into<String>) -> Self {
        let mut node = Self::with_type(NodeType::BrowserReference, name);
        node.connection_config_id = Some(connection_config_id.into());
        node
    }

    /// Override the generated ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// True for folder nodes
    pub fn is_folder(&self) -> bool {
        self.node_type == NodeType::Folder
    }

    /// True for leaf references to a connection
    pub fn is_browser_reference(&self) -> bool {
        self.node_type == NodeType::BrowserReference
    }

    /// Append a child ID unless already present
    pub(crate) fn add_child(&mut self, child_id: &str) {
        if !self.child_ids.iter().any(|c| c == child_id) {
            self.child_ids.push(child_id.to_string());
        }
    }

    pub(crate) fn remove_child(&mut self, child_id: &str) {
        self.child_ids.retain(|c| c != child_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique() {
        let a = HierarchyNode::folder("Prod");
        let b = HierarchyNode::folder("Prod");
        assert_ne!(a.id, b.id);
        assert!(a.is_folder());
        assert!(a.connection_config_id.is_none());
    }

    #[test]
    fn test_add_child_is_idempotent() {
        let mut node = HierarchyNode::folder("Prod");
        node.add_child("c1");
        node.add_child("c1");
        node.add_child("c2");
        assert_eq!(node.child_ids, vec!["c1", "c2"]);

        node.remove_child("c1");
        assert_eq!(node.child_ids, vec!["c2"]);
    }

    #[test]
    fn test_serialized_shape() {
        let node = HierarchyNode::browser("QM1", "qm1-profile").with_id("n1");
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["id"], "n1");
        assert_eq!(json["type"], "BrowserReference");
        assert_eq!(json["connectionConfigId"], "qm1-profile");
        assert!(json["parentId"].is_null());
        assert_eq!(json["childIds"], serde_json::json!([]));
    }
}
