//! Arena-backed hierarchy store

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::node::HierarchyNode;

/// Mutable folder tree of connection references.
///
/// Serializes as the hierarchy document `{ nodes, rootNodeIds, selectedNodeId }`.
/// Not synchronized; callers sharing a store across threads must wrap it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyStore {
    /// All nodes indexed by ID
    #[serde(default)]
    nodes: HashMap<String, HierarchyNode>,
    /// Root-level node IDs in display order
    #[serde(default)]
    root_node_ids: Vec<String>,
    /// Currently selected node
    #[serde(default)]
    selected_node_id: Option<String>,
}

impl HierarchyStore {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &str) -> Option<&HierarchyNode> {
        self.nodes.get(id)
    }

    /// Root-level node IDs in order
    pub fn root_ids(&self) -> &[String] {
        &self.root_node_ids
    }

    /// Add a node under `parent_id`, or at root level when `parent_id` is None.
    ///
    /// An unknown parent falls back to root. Re-adding an ID that is already
    /// present replaces the node's payload; it keeps its children and, when
    /// already under `parent_id`, its position among its siblings. Otherwise
    /// it is relocated like [`move_node`](Self::move_node).
    pub fn add_node(&mut self, mut node: HierarchyNode, parent_id: Option<&str>) -> String {
        let id = node.id.clone();

        if let Some(existing) = self.nodes.get(&id) {
            let in_place = existing.parent_id.as_deref() == parent_id;
            node.parent_id = existing.parent_id.clone();
            node.child_ids = existing.child_ids.clone();
            self.nodes.insert(id.clone(), node);
            if in_place {
                tracing::debug!(node_id = %id, "Updated node in place");
                return id;
            }
            if !self.move_node(&id, parent_id) {
                tracing::warn!(node_id = %id, "Re-added node kept at its previous position");
            }
            return id;
        }

        node.parent_id = None;
        node.child_ids.clear();
        self.nodes.insert(id.clone(), node);
        self.attach(&id, parent_id);

        tracing::debug!(node_id = %id, parent_id = ?parent_id, "Added node");
        id
    }

    /// Remove a node and all of its descendants.
    ///
    /// Returns the number of nodes removed (0 if the ID is unknown).
    pub fn remove_node(&mut self, id: &str) -> usize {
        if !self.nodes.contains_key(id) {
            tracing::warn!(node_id = %id, "Node not found for removal");
            return 0;
        }

        self.detach(id);

        let mut removed = 0;
        let mut pending = vec![id.to_string()];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                removed += 1;
                if self.selected_node_id.as_deref() == Some(current.as_str()) {
                    self.selected_node_id = None;
                }
                pending.extend(node.child_ids);
            }
        }

        tracing::debug!(node_id = %id, removed, "Removed node");
        removed
    }

    /// Move a node under a new parent (None for root level).
    ///
    /// Returns false without touching the tree if the node is unknown, if it
    /// would become its own parent, or if the new parent is one of its
    /// descendants.
    pub fn move_node(&mut self, id: &str, new_parent_id: Option<&str>) -> bool {
        if !self.nodes.contains_key(id) {
            tracing::warn!(node_id = %id, "Node not found for move");
            return false;
        }

        if new_parent_id == Some(id) {
            tracing::warn!(node_id = %id, "Cannot move node into itself");
            return false;
        }

        if let Some(parent_id) = new_parent_id {
            if self.is_descendant(parent_id, id) {
                tracing::warn!(
                    node_id = %id,
                    new_parent_id = %parent_id,
                    "Cannot move node into its own descendant"
                );
                return false;
            }
        }

        self.detach(id);
        self.attach(id, new_parent_id);

        tracing::debug!(node_id = %id, new_parent_id = ?new_parent_id, "Moved node");
        true
    }

    /// Ordered children of `parent_id`; None yields the root-level nodes
    pub fn get_children(&self, parent_id: Option<&str>) -> Vec<&HierarchyNode> {
        let ids = match parent_id {
            None => &self.root_node_ids,
            Some(pid) => match self.nodes.get(pid) {
                Some(parent) => &parent.child_ids,
                None => return Vec::new(),
            },
        };

        ids.iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    /// Rename a node; false if the ID is unknown
    pub fn rename_node(&mut self, id: &str, name: impl Into<String>) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Set a folder's expanded flag; false if the ID is unknown
    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    /// Select a node (None clears the selection). Unknown IDs are rejected.
    pub fn select_node(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if !self.nodes.contains_key(id) => {
                tracing::warn!(node_id = %id, "Cannot select unknown node");
                false
            }
            _ => {
                self.selected_node_id = id.map(str::to_string);
                true
            }
        }
    }

    /// The selected node, if any
    pub fn selected_node(&self) -> Option<&HierarchyNode> {
        self.selected_node_id
            .as_deref()
            .and_then(|id| self.nodes.get(id))
    }

    /// All nodes in display order, paired with their depth (roots are 0)
    pub fn walk(&self) -> Vec<(usize, &HierarchyNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut pending: Vec<(usize, &str)> = self
            .root_node_ids
            .iter()
            .rev()
            .map(|id| (0, id.as_str()))
            .collect();

        while let Some((depth, id)) = pending.pop() {
            if out.len() >= self.nodes.len() {
                break;
            }
            if let Some(node) = self.nodes.get(id) {
                out.push((depth, node));
                pending.extend(node.child_ids.iter().rev().map(|c| (depth + 1, c.as_str())));
            }
        }

        out
    }

    /// All browser references in display order
    pub fn browser_references(&self) -> Vec<&HierarchyNode> {
        self.walk()
            .into_iter()
            .map(|(_, node)| node)
            .filter(|node| node.is_browser_reference())
            .collect()
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, id: &str) -> Vec<&HierarchyNode> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent_id.as_deref());

        // Bounded so a corrupt document cannot spin forever
        while let Some(pid) = current {
            if out.len() >= self.nodes.len() {
                break;
            }
            match self.nodes.get(pid) {
                Some(parent) => {
                    out.push(parent);
                    current = parent.parent_id.as_deref();
                }
                None => break,
            }
        }

        out
    }

    /// Names from the root down to the node itself
    pub fn path(&self, id: &str) -> Vec<String> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };

        let mut names: Vec<String> = self
            .ancestors(id)
            .into_iter()
            .map(|n| n.name.clone())
            .collect();
        names.reverse();
        names.push(node.name.clone());
        names
    }

    /// Check the forest invariant on a store built from an untrusted document
    pub fn validate(&self) -> Result<(), HierarchyError> {
        let mut seen_roots = HashSet::new();
        for root_id in &self.root_node_ids {
            let node = self
                .nodes
                .get(root_id)
                .ok_or_else(|| HierarchyError::UnknownRoot(root_id.clone()))?;
            if node.parent_id.is_some() || !seen_roots.insert(root_id.as_str()) {
                return Err(HierarchyError::BadRoot(root_id.clone()));
            }
        }

        for (key, node) in &self.nodes {
            if key != &node.id {
                return Err(HierarchyError::IdMismatch {
                    key: key.clone(),
                    id: node.id.clone(),
                });
            }

            match node.parent_id.as_deref() {
                None => {
                    if !seen_roots.contains(key.as_str()) {
                        return Err(HierarchyError::Unlinked(key.clone()));
                    }
                }
                Some(pid) => {
                    let parent = self.nodes.get(pid).ok_or_else(|| HierarchyError::MissingParent {
                        id: key.clone(),
                        parent_id: pid.to_string(),
                    })?;
                    if parent.child_ids.iter().filter(|c| *c == key).count() != 1 {
                        return Err(HierarchyError::Unlinked(key.clone()));
                    }
                }
            }

            for child_id in &node.child_ids {
                let linked = self
                    .nodes
                    .get(child_id)
                    .map(|child| child.parent_id.as_deref() == Some(key.as_str()))
                    .unwrap_or(false);
                if !linked {
                    return Err(HierarchyError::ChildMismatch {
                        id: key.clone(),
                        child_id: child_id.clone(),
                    });
                }
            }

            if self.is_descendant(key, key) {
                return Err(HierarchyError::Cycle(key.clone()));
            }
        }

        if let Some(selected) = &self.selected_node_id {
            if !self.nodes.contains_key(selected) {
                return Err(HierarchyError::DanglingSelection(selected.clone()));
            }
        }

        Ok(())
    }

    /// Whether `candidate` sits somewhere below `ancestor_id`
    fn is_descendant(&self, candidate: &str, ancestor_id: &str) -> bool {
        let mut current = self.nodes.get(candidate).and_then(|n| n.parent_id.as_deref());
        let mut steps = 0;

        while let Some(pid) = current {
            if pid == ancestor_id {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                // Parent chain longer than the node count means a cycle
                return true;
            }
            current = self.nodes.get(pid).and_then(|n| n.parent_id.as_deref());
        }

        false
    }

    fn detach(&mut self, id: &str) {
        let parent_id = self.nodes.get(id).and_then(|n| n.parent_id.clone());
        if let Some(pid) = parent_id {
            if let Some(parent) = self.nodes.get_mut(&pid) {
                parent.remove_child(id);
            }
        }
        self.root_node_ids.retain(|r| r != id);
    }

    fn attach(&mut self, id: &str, parent_id: Option<&str>) {
        let resolved = match parent_id {
            Some(pid) if self.nodes.contains_key(pid) => Some(pid.to_string()),
            Some(pid) => {
                tracing::warn!(node_id = %id, parent_id = %pid, "Parent node not found, attaching to root");
                None
            }
            None => None,
        };

        match resolved.as_deref() {
            Some(pid) => {
                if let Some(parent) = self.nodes.get_mut(pid) {
                    parent.add_child(id);
                }
            }
            None => {
                if !self.root_node_ids.iter().any(|r| r == id) {
                    self.root_node_ids.push(id.to_string());
                }
            }
        }

        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_id = resolved;
        }
    }
}

/// Forest invariant violations found by [`HierarchyStore::validate`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("Root list references unknown node: {0}")]
    UnknownRoot(String),

    #[error("Root entry {0} has a parent or is listed twice")]
    BadRoot(String),

    #[error("Node stored under key {key} carries id {id}")]
    IdMismatch { key: String, id: String },

    #[error("Node {id} references missing parent {parent_id}")]
    MissingParent { id: String, parent_id: String },

    #[error("Node {0} is not linked exactly once from its parent or the root list")]
    Unlinked(String),

    #[error("Node {id} lists child {child_id} which does not point back")]
    ChildMismatch { id: String, child_id: String },

    #[error("Node {0} is its own ancestor")]
    Cycle(String),

    #[error("Selection references unknown node: {0}")]
    DanglingSelection(String),
}
