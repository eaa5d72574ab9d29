//! mqwatch: Queue Depth Monitoring and Connection Hierarchy
//!
//! Organizes message-queue manager connections into a folder tree and
//! continuously watches queue depths against per-queue thresholds, recording
//! every alert level transition exactly once.
//!
//! # Features
//!
//! - **Hierarchy Store**: Folder tree of connection references with cycle-safe moves
//! - **Threshold Evaluation**: Percentage or absolute warning/critical thresholds
//! - **Alert Tracking**: Per-queue levels with an append-only transition history
//! - **Background Monitor**: Single polling task with pause/resume and clamped intervals
//! - **Channel Delivery**: Refreshed queue lists pushed to an ordered consumer channel
//! - **JSON Config Store**: Thresholds, connections and hierarchy persisted as JSON
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mqwatch::alerts::{AlertTracker, LogNotifier, ThresholdRegistry};
//! use mqwatch::monitor::{ChannelListener, MonitorLoop};
//! use mqwatch::source::{QueueSnapshot, StaticQueueSource};
//!
//! # async fn run() {
//! let source = Arc::new(StaticQueueSource::new(vec![QueueSnapshot::new("DEV.QUEUE.1", 80, 100)]));
//! let tracker = Arc::new(AlertTracker::new(Arc::new(LogNotifier)));
//! let monitor = MonitorLoop::new(source, tracker.clone(), Arc::new(ThresholdRegistry::new()));
//!
//! let (listener, mut updates) = ChannelListener::new();
//! monitor.set_listener(Arc::new(listener));
//! monitor.add_queue(QueueSnapshot::new("DEV.QUEUE.1", 0, 100));
//! let handle = monitor.start();
//!
//! if let Some(update) = updates.recv().await {
//!     println!("{:?} -> {}", update, tracker.current_level("DEV.QUEUE.1"));
//! }
//!
//! monitor.stop();
//! handle.await.unwrap();
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod hierarchy;
pub mod monitor;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use alerts::{AlertEvent, AlertLevel, AlertTracker, ThresholdConfig};
pub use config::AppConfig;
pub use hierarchy::{HierarchyNode, HierarchyStore, NodeType};
pub use monitor::{MonitorListener, MonitorLoop};
pub use source::{QueueDataSource, QueueSnapshot};
pub use store::{ConfigStore, JsonConfigStore};
