//! Queue depth sources
//!
//! The monitor pulls [`QueueSnapshot`]s through the [`QueueDataSource`] trait;
//! how a source talks to the queue manager is its own business.

pub mod http;
pub mod memory;

pub use http::HttpQueueSource;
pub use memory::StaticQueueSource;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Point-in-time depth reading for one queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub queue_name: String,
    pub current_depth: u32,
    pub max_depth: u32,
    #[serde(default)]
    pub open_input_count: u32,
    #[serde(default)]
    pub open_output_count: u32,
}

impl QueueSnapshot {
    /// Snapshot with no open handles
    pub fn new(queue_name: impl Into<String>, current_depth: u32, max_depth: u32) -> Self {
        Self {
            queue_name: queue_name.into(),
            current_depth,
            max_depth,
            open_input_count: 0,
            open_output_count: 0,
        }
    }

    /// Depth as a percentage of max depth (0 when max depth is 0)
    pub fn depth_percentage(&self) -> f64 {
        if self.max_depth == 0 {
            return 0.0;
        }
        f64::from(self.current_depth) * 100.0 / f64::from(self.max_depth)
    }

    /// Copy the readings of a fresher snapshot for the same queue
    pub fn refresh_from(&mut self, fresh: &QueueSnapshot) {
        self.current_depth = fresh.current_depth;
        self.max_depth = fresh.max_depth;
        self.open_input_count = fresh.open_input_count;
        self.open_output_count = fresh.open_output_count;
    }
}

impl std::fmt::Display for QueueSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}/{})", self.queue_name, self.current_depth, self.max_depth)
    }
}

/// Source of queue depth readings
#[async_trait]
pub trait QueueDataSource: Send + Sync {
    /// Current readings for every queue the source knows
    async fn get_all_snapshots(&self) -> Result<Vec<QueueSnapshot>, SourceError>;

    /// Current reading for a single queue
    async fn refresh_snapshot(&self, queue_name: &str) -> Result<QueueSnapshot, SourceError>;
}

/// Queue source errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Source returned status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_percentage() {
        assert_eq!(QueueSnapshot::new("Q1", 25, 100).depth_percentage(), 25.0);
        assert_eq!(QueueSnapshot::new("Q1", 25, 0).depth_percentage(), 0.0);
    }

    #[test]
    fn test_refresh_keeps_name() {
        let mut existing = QueueSnapshot::new("Q1", 1, 100);
        let mut fresh = QueueSnapshot::new("Q1", 42, 500);
        fresh.open_input_count = 3;

        existing.refresh_from(&fresh);
        assert_eq!(existing, fresh);
        assert_eq!(existing.to_string(), "Q1 (42/500)");
    }

    #[test]
    fn test_snapshot_document_defaults() {
        let snapshot: QueueSnapshot =
            serde_json::from_str(r#"{"queueName":"Q1","currentDepth":5,"maxDepth":10}"#).unwrap();
        assert_eq!(snapshot, QueueSnapshot::new("Q1", 5, 10));
    }
}
