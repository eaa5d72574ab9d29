//! In-memory queue source

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{QueueDataSource, QueueSnapshot, SourceError};

/// Source backed by a settable list of snapshots.
///
/// Failures can be queued with [`fail_next`](Self::fail_next); each queued
/// failure is returned by exactly one `get_all_snapshots` call.
#[derive(Debug, Default)]
pub struct StaticQueueSource {
    snapshots: RwLock<Vec<QueueSnapshot>>,
    failures: RwLock<VecDeque<String>>,
}

impl StaticQueueSource {
    /// Source serving the given snapshots
    pub fn new(snapshots: Vec<QueueSnapshot>) -> Self {
        Self {
            snapshots: RwLock::new(snapshots),
            failures: RwLock::new(VecDeque::new()),
        }
    }

    /// Replace every reading
    pub fn set_snapshots(&self, snapshots: Vec<QueueSnapshot>) {
        *self.snapshots.write() = snapshots;
    }

    /// Set the depth of one queue, adding it if unknown
    pub fn set_depth(&self, queue_name: &str, current_depth: u32, max_depth: u32) {
        let mut snapshots = self.snapshots.write();
        match snapshots.iter_mut().find(|s| s.queue_name == queue_name) {
            Some(s) => {
                s.current_depth = current_depth;
                s.max_depth = max_depth;
            }
            None => snapshots.push(QueueSnapshot::new(queue_name, current_depth, max_depth)),
        }
    }

    /// Make the next fetch fail with a transport error
    pub fn fail_next(&self, message: impl Into<String>) {
        self.failures.write().push_back(message.into());
    }
}

#[async_trait]
impl QueueDataSource for StaticQueueSource {
    async fn get_all_snapshots(&self) -> Result<Vec<QueueSnapshot>, SourceError> {
        if let Some(message) = self.failures.write().pop_front() {
            return Err(SourceError::Transport(message));
        }
        Ok(self.snapshots.read().clone())
    }

    async fn refresh_snapshot(&self, queue_name: &str) -> Result<QueueSnapshot, SourceError> {
        self.snapshots
            .read()
            .iter()
            .find(|s| s.queue_name == queue_name)
            .cloned()
            .ok_or_else(|| SourceError::QueueNotFound(queue_name.to_string()))
    }
}
