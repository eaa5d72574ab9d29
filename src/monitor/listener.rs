//! Monitor result delivery

use tokio::sync::mpsc;

use crate::source::QueueSnapshot;

/// Receives the outcome of each monitor tick.
///
/// Called on the worker task; a listener that needs to run elsewhere should
/// forward through [`ChannelListener`].
pub trait MonitorListener: Send + Sync {
    /// Refreshed monitored list after a successful tick
    fn on_queues_updated(&self, queues: &[QueueSnapshot]);

    /// A tick failed; the loop keeps running
    fn on_monitor_error(&self, error: &MonitorError);
}

/// Tick failures reported to listeners
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    #[error("Failed to fetch queue snapshots: {0}")]
    Fetch(String),

    #[error("Monitor tick panicked: {0}")]
    Panicked(String),
}

/// Message pushed by [`ChannelListener`]
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorUpdate {
    QueuesUpdated(Vec<QueueSnapshot>),
    Error(MonitorError),
}

/// Listener that turns callbacks into ordered channel messages
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<MonitorUpdate>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its update channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MonitorUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, update: MonitorUpdate) {
        if self.tx.send(update).is_err() {
            tracing::debug!("Monitor update dropped, receiver closed");
        }
    }
}

impl MonitorListener for ChannelListener {
    fn on_queues_updated(&self, queues: &[QueueSnapshot]) {
        self.send(MonitorUpdate::QueuesUpdated(queues.to_vec()));
    }

    fn on_monitor_error(&self, error: &MonitorError) {
        self.send(MonitorUpdate::Error(error.clone()));
    }
}

/// Drain a channel into a listener on the consumer's side, in order, until
/// every sender is gone. Returns the number of messages delivered.
pub async fn drain_updates(
    mut rx: mpsc::UnboundedReceiver<MonitorUpdate>,
    listener: &dyn MonitorListener,
) -> usize {
    let mut delivered = 0;
    while let Some(update) = rx.recv().await {
        match &update {
            MonitorUpdate::QueuesUpdated(queues) => listener.on_queues_updated(queues),
            MonitorUpdate::Error(error) => listener.on_monitor_error(error),
        }
        delivered += 1;
    }
    delivered
}
