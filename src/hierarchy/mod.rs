//! Folder hierarchy of queue manager connections
//!
//! Nodes live in a flat id-indexed arena with explicit parent and child id
//! links, so the whole tree serializes as a single document and cycle checks
//! are a walk up the parent chain.

pub mod node;
pub mod store;

pub use node::{HierarchyNode, NodeType};
pub use store::{HierarchyError, HierarchyStore};
