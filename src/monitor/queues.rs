//! Copy-on-write set of monitored queues

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::source::QueueSnapshot;

/// Monitored queues, replaced wholesale on every mutation.
///
/// Readers take a cheap `Arc` of the current list and iterate it without
/// holding any lock, so the control side can add or remove queues while the
/// worker walks the previous version.
#[derive(Debug, Default)]
pub struct MonitoredQueues {
    current: RwLock<Arc<Vec<QueueSnapshot>>>,
}

impl MonitoredQueues {
    /// Create an empty queue list
    pub fn new() -> Self {
        Self::default()
    }

    /// Current list
    pub fn snapshot(&self) -> Arc<Vec<QueueSnapshot>> {
        self.current.read().clone()
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Whether a queue with this name is monitored
    pub fn contains(&self, queue_name: &str) -> bool {
        self.current.read().iter().any(|q| q.queue_name == queue_name)
    }

    /// Replace the whole list
    pub fn replace(&self, queues: Vec<QueueSnapshot>) {
        *self.current.write() = Arc::new(queues);
    }

    /// Append a queue unless one with the same name is already present
    pub fn add(&self, queue: QueueSnapshot) -> bool {
        let mut current = self.current.write();
        if current.iter().any(|q| q.queue_name == queue.queue_name) {
            return false;
        }
        let mut next = (**current).clone();
        next.push(queue);
        *current = Arc::new(next);
        true
    }

    /// Remove a queue by name
    pub fn remove(&self, queue_name: &str) -> bool {
        let mut current = self.current.write();
        if !current.iter().any(|q| q.queue_name == queue_name) {
            return false;
        }
        let next: Vec<QueueSnapshot> = current
            .iter()
            .filter(|q| q.queue_name != queue_name)
            .cloned()
            .collect();
        *current = Arc::new(next);
        true
    }

    /// Merge fresh readings into the list by queue name.
    ///
    /// Entries without a fresh reading are kept unchanged and fresh readings
    /// for queues that are not monitored are ignored. Returns the new list.
    pub fn apply_refresh(&self, fresh: &[QueueSnapshot]) -> Arc<Vec<QueueSnapshot>> {
        let by_name: HashMap<&str, &QueueSnapshot> =
            fresh.iter().map(|s| (s.queue_name.as_str(), s)).collect();

        let mut current = self.current.write();
        let next: Vec<QueueSnapshot> = current
            .iter()
            .map(|existing| {
                let mut queue = existing.clone();
                if let Some(update) = by_name.get(existing.queue_name.as_str()) {
                    queue.refresh_from(update);
                }
                queue
            })
            .collect();

        let next = Arc::new(next);
        *current = Arc::clone(&next);
        next
    }
}
