//! Background queue depth polling

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use super::listener::{MonitorError, MonitorListener};
use super::queues::MonitoredQueues;
use crate::alerts::{AlertLevel, AlertTracker, ThresholdRegistry};
use crate::source::{QueueDataSource, QueueSnapshot, SourceError};

pub const MIN_REFRESH_INTERVAL_MS: u64 = 1_000;
pub const MAX_REFRESH_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 5_000;

/// Lifecycle state of the monitor loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
    Paused,
}

impl MonitorState {
    fn as_u8(self) -> u8 {
        match self {
            MonitorState::Stopped => 0,
            MonitorState::Running => 1,
            MonitorState::Paused => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => MonitorState::Running,
            2 => MonitorState::Paused,
            _ => MonitorState::Stopped,
        }
    }
}

/// State shared between the handle and the worker task
struct Shared {
    source: Arc<dyn QueueDataSource>,
    tracker: Arc<AlertTracker>,
    thresholds: Arc<ThresholdRegistry>,
    queues: MonitoredQueues,
    state: AtomicU8,
    refresh_interval_ms: AtomicU64,
    listener: RwLock<Option<Arc<dyn MonitorListener>>>,
}

impl Shared {
    fn state(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn transition(&self, from: MonitorState, to: MonitorState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn listener(&self) -> Option<Arc<dyn MonitorListener>> {
        self.listener.read().clone()
    }

    fn report_error(&self, error: MonitorError) {
        if let Some(listener) = self.listener() {
            listener.on_monitor_error(&error);
        }
    }

    /// Fetch, merge, evaluate and publish once
    async fn tick(&self) {
        let fresh = match self.source.get_all_snapshots().await {
            Ok(fresh) => fresh,
            Err(e) => {
                tracing::error!(error = %e, "Error updating queues");
                self.report_error(MonitorError::Fetch(e.to_string()));
                return;
            }
        };

        let queues = self.queues.apply_refresh(&fresh);
        for queue in queues.iter() {
            let config = self.thresholds.get_or_default(&queue.queue_name);
            self.tracker.check_queue(queue, &config);
        }

        tracing::debug!(queues = queues.len(), "Monitor tick complete");

        if let Some(listener) = self.listener() {
            listener.on_queues_updated(&queues);
        }
    }
}

/// Polls queue depths on a single background task and feeds the alert tracker
pub struct MonitorLoop {
    shared: Arc<Shared>,
    /// Shutdown signal sender for the current worker
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl MonitorLoop {
    /// Create a stopped monitor
    pub fn new(
        source: Arc<dyn QueueDataSource>,
        tracker: Arc<AlertTracker>,
        thresholds: Arc<ThresholdRegistry>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                tracker,
                thresholds,
                queues: MonitoredQueues::new(),
                state: AtomicU8::new(MonitorState::Stopped.as_u8()),
                refresh_interval_ms: AtomicU64::new(DEFAULT_REFRESH_INTERVAL_MS),
                listener: RwLock::new(None),
            }),
            shutdown_tx: Mutex::new(None),
        }
    }

    /// Install the listener that receives refreshed queues and errors
    pub fn set_listener(&self, listener: Arc<dyn MonitorListener>) {
        *self.shared.listener.write() = Some(listener);
    }

    /// Remove the listener; ticks still run
    pub fn clear_listener(&self) {
        *self.shared.listener.write() = None;
    }

    /// Spawn the worker.
    ///
    /// Does not check for an existing worker: calling this while running
    /// replaces the shutdown handle of the previous worker, which then exits
    /// after its current tick. Check [`is_running`](Self::is_running) first.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        if self.is_running() {
            tracing::warn!("Queue monitor started while already running");
        }

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.lock() = Some(shutdown_tx);
        self.shared
            .state
            .store(MonitorState::Running.as_u8(), Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            tracing::info!("Queue monitor started");

            loop {
                match shared.state() {
                    MonitorState::Stopped => break,
                    MonitorState::Running if !shared.queues.is_empty() => {
                        Self::run_guarded_tick(&shared).await;
                    }
                    _ => {}
                }

                let interval = Duration::from_millis(shared.refresh_interval_ms.load(Ordering::SeqCst));
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Queue monitor interrupted");
                        break;
                    }
                }
            }

            tracing::info!("Queue monitor stopped");
        })
    }

    /// Run one tick on its own task so a panicking source or listener is
    /// reported instead of killing the loop
    async fn run_guarded_tick(shared: &Arc<Shared>) {
        let tick_shared = Arc::clone(shared);
        let result = tokio::spawn(async move { tick_shared.tick().await }).await;

        if let Err(e) = result {
            let message = if e.is_panic() {
                let panic = e.into_panic();
                if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                }
            } else {
                e.to_string()
            };

            tracing::error!(panic_msg = %message, "Queue monitor tick failed");
            shared.report_error(MonitorError::Panicked(message));
        }
    }

    /// Stop the worker from any state, interrupting its sleep
    pub fn stop(&self) {
        self.shared
            .state
            .store(MonitorState::Stopped.as_u8(), Ordering::SeqCst);
        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.try_send(());
        }
    }

    /// Suspend ticking without stopping the worker
    pub fn pause(&self) -> bool {
        let paused = self.shared.transition(MonitorState::Running, MonitorState::Paused);
        if paused {
            tracing::info!("Queue monitoring paused");
        }
        paused
    }

    /// Resume ticking after a pause
    pub fn resume(&self) -> bool {
        let resumed = self.shared.transition(MonitorState::Paused, MonitorState::Running);
        if resumed {
            tracing::info!("Queue monitoring resumed");
        }
        resumed
    }

    /// Current lifecycle state
    pub fn state(&self) -> MonitorState {
        self.shared.state()
    }

    /// True while a worker is active, paused or not
    pub fn is_running(&self) -> bool {
        self.state() != MonitorState::Stopped
    }

    /// True while paused
    pub fn is_paused(&self) -> bool {
        self.state() == MonitorState::Paused
    }

    /// Set the refresh interval, clamped to 1s..=60s. Applies from the next sleep.
    pub fn set_refresh_interval(&self, interval_ms: u64) {
        let clamped = interval_ms.clamp(MIN_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS);
        self.shared
            .refresh_interval_ms
            .store(clamped, Ordering::SeqCst);
        tracing::info!("Refresh interval set to {} ms", clamped);
    }

    /// Current (clamped) refresh interval
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.shared.refresh_interval_ms.load(Ordering::SeqCst))
    }

    /// Replace the monitored set
    pub fn set_monitored_queues(&self, queues: Vec<QueueSnapshot>) {
        let count = queues.len();
        self.shared.queues.replace(queues);
        tracing::info!("Monitoring {} queues", count);
    }

    /// Add a queue unless one with the same name is monitored
    pub fn add_queue(&self, queue: QueueSnapshot) -> bool {
        let name = queue.queue_name.clone();
        let added = self.shared.queues.add(queue);
        if added {
            tracing::info!(queue = %name, "Added queue to monitoring");
        }
        added
    }

    /// Stop monitoring a queue; false if it was not monitored
    pub fn remove_queue(&self, queue_name: &str) -> bool {
        let removed = self.shared.queues.remove(queue_name);
        if removed {
            tracing::info!(queue = %queue_name, "Removed queue from monitoring");
        }
        removed
    }

    /// Current monitored list with the latest merged readings
    pub fn monitored_queues(&self) -> Arc<Vec<QueueSnapshot>> {
        self.shared.queues.snapshot()
    }

    /// Tracker fed by this monitor
    pub fn tracker(&self) -> &Arc<AlertTracker> {
        &self.shared.tracker
    }

    /// Run one tick immediately, whatever the loop state
    pub async fn refresh_now(&self) {
        if self.shared.queues.is_empty() {
            return;
        }
        self.shared.tick().await;
    }

    /// Re-read a single monitored queue and evaluate it
    pub async fn refresh_queue(&self, queue_name: &str) -> Result<AlertLevel, SourceError> {
        let fresh = self.shared.source.refresh_snapshot(queue_name).await?;
        let queues = self.shared.queues.apply_refresh(std::slice::from_ref(&fresh));

        let queue = queues
            .iter()
            .find(|q| q.queue_name == queue_name)
            .ok_or_else(|| SourceError::QueueNotFound(queue_name.to_string()))?;
        let config = self.shared.thresholds.get_or_default(queue_name);

        Ok(self.shared.tracker.check_queue(queue, &config))
    }
}

impl std::fmt::Debug for MonitorLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorLoop")
            .field("state", &self.state())
            .field("refresh_interval", &self.refresh_interval())
            .field("queues", &self.shared.queues.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{LogNotifier, ThresholdConfig};
    use crate::monitor::listener::{ChannelListener, MonitorUpdate};
    use crate::source::StaticQueueSource;
    use async_trait::async_trait;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    struct Fixture {
        source: Arc<StaticQueueSource>,
        monitor: MonitorLoop,
        rx: UnboundedReceiver<MonitorUpdate>,
    }

    fn fixture(snapshots: Vec<QueueSnapshot>) -> Fixture {
        let source = Arc::new(StaticQueueSource::new(snapshots));
        let tracker = Arc::new(AlertTracker::new(Arc::new(LogNotifier)));
        let thresholds = Arc::new(ThresholdRegistry::new());
        let monitor = MonitorLoop::new(source.clone(), tracker, thresholds);

        let (listener, rx) = ChannelListener::new();
        monitor.set_listener(Arc::new(listener));

        Fixture { source, monitor, rx }
    }

    async fn next_update(rx: &mut UnboundedReceiver<MonitorUpdate>) -> MonitorUpdate {
        timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("no monitor update")
            .expect("channel closed")
    }

    #[test]
    fn test_refresh_interval_is_clamped() {
        let f = fixture(vec![]);
        assert_eq!(f.monitor.refresh_interval(), Duration::from_millis(5_000));

        f.monitor.set_refresh_interval(500);
        assert_eq!(f.monitor.refresh_interval(), Duration::from_millis(1_000));

        f.monitor.set_refresh_interval(999_999);
        assert_eq!(f.monitor.refresh_interval(), Duration::from_millis(60_000));

        f.monitor.set_refresh_interval(2_500);
        assert_eq!(f.monitor.refresh_interval(), Duration::from_millis(2_500));
    }

    #[tokio::test]
    async fn test_refresh_now_merges_and_evaluates() {
        let mut f = fixture(vec![
            QueueSnapshot::new("Q1", 95, 100),
            QueueSnapshot::new("UNWATCHED", 100, 100),
        ]);
        f.monitor.set_monitored_queues(vec![
            QueueSnapshot::new("Q1", 0, 100),
            QueueSnapshot::new("GONE", 3, 100),
        ]);

        f.monitor.refresh_now().await;

        let queues = f.monitor.monitored_queues();
        assert_eq!(queues[0], QueueSnapshot::new("Q1", 95, 100));
        assert_eq!(queues[1], QueueSnapshot::new("GONE", 3, 100));

        let tracker = f.monitor.tracker();
        assert_eq!(tracker.current_level("Q1"), AlertLevel::Critical);
        assert_eq!(tracker.current_level("UNWATCHED"), AlertLevel::None);

        match next_update(&mut f.rx).await {
            MonitorUpdate::QueuesUpdated(list) => assert_eq!(list.len(), 2),
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_configured_thresholds_are_used() {
        let f = fixture(vec![QueueSnapshot::new("Q1", 15, 1000)]);
        f.monitor
            .shared
            .thresholds
            .set(ThresholdConfig::new("Q1").with_absolute(10, 20));
        f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 1000));

        f.monitor.refresh_now().await;
        assert_eq!(f.monitor.tracker().current_level("Q1"), AlertLevel::Warning);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_ticks_until_stopped() {
        let mut f = fixture(vec![QueueSnapshot::new("Q1", 75, 100)]);
        f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 100));
        f.monitor.set_refresh_interval(1_000);

        let handle = f.monitor.start();
        assert!(f.monitor.is_running());

        assert!(matches!(next_update(&mut f.rx).await, MonitorUpdate::QueuesUpdated(_)));
        assert_eq!(f.monitor.tracker().current_level("Q1"), AlertLevel::Warning);

        f.source.set_depth("Q1", 95, 100);
        assert!(matches!(next_update(&mut f.rx).await, MonitorUpdate::QueuesUpdated(_)));
        assert_eq!(f.monitor.tracker().current_level("Q1"), AlertLevel::Critical);
        assert_eq!(f.monitor.tracker().history().len(), 2);

        f.monitor.stop();
        assert_eq!(f.monitor.state(), MonitorState::Stopped);
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker did not exit")
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_does_not_end_loop() {
        let mut f = fixture(vec![QueueSnapshot::new("Q1", 10, 100)]);
        f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 100));
        f.source.fail_next("connection refused");

        let handle = f.monitor.start();

        match next_update(&mut f.rx).await {
            MonitorUpdate::Error(MonitorError::Fetch(msg)) => assert!(msg.contains("connection refused")),
            other => panic!("unexpected update: {:?}", other),
        }
        assert!(matches!(next_update(&mut f.rx).await, MonitorUpdate::QueuesUpdated(_)));
        assert!(f.monitor.is_running());

        f.monitor.stop();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_resume() {
        let mut f = fixture(vec![QueueSnapshot::new("Q1", 10, 100)]);
        f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 100));

        assert!(!f.monitor.pause(), "cannot pause a stopped loop");

        let handle = f.monitor.start();
        assert!(matches!(next_update(&mut f.rx).await, MonitorUpdate::QueuesUpdated(_)));

        assert!(f.monitor.pause());
        assert!(f.monitor.is_paused());
        assert!(f.monitor.is_running());
        assert!(timeout(Duration::from_secs(20), f.rx.recv()).await.is_err());

        assert!(f.monitor.resume());
        assert!(!f.monitor.resume());
        assert!(matches!(next_update(&mut f.rx).await, MonitorUpdate::QueuesUpdated(_)));

        f.monitor.stop();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_set_does_not_tick() {
        let mut f = fixture(vec![QueueSnapshot::new("Q1", 10, 100)]);
        let handle = f.monitor.start();

        assert!(timeout(Duration::from_secs(20), f.rx.recv()).await.is_err());

        f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 100));
        assert!(matches!(next_update(&mut f.rx).await, MonitorUpdate::QueuesUpdated(_)));

        f.monitor.stop();
        handle.await.unwrap();
    }

    struct PanickingSource;

    #[async_trait]
    impl QueueDataSource for PanickingSource {
        async fn get_all_snapshots(&self) -> Result<Vec<QueueSnapshot>, SourceError> {
            panic!("source exploded");
        }

        async fn refresh_snapshot(&self, queue_name: &str) -> Result<QueueSnapshot, SourceError> {
            Err(SourceError::QueueNotFound(queue_name.to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_tick_is_reported() {
        let tracker = Arc::new(AlertTracker::new(Arc::new(LogNotifier)));
        let monitor = MonitorLoop::new(
            Arc::new(PanickingSource),
            tracker,
            Arc::new(ThresholdRegistry::new()),
        );
        let (listener, mut rx) = ChannelListener::new();
        monitor.set_listener(Arc::new(listener));
        monitor.add_queue(QueueSnapshot::new("Q1", 0, 100));

        let handle = monitor.start();

        for _ in 0..2 {
            match next_update(&mut rx).await {
                MonitorUpdate::Error(MonitorError::Panicked(msg)) => assert_eq!(msg, "source exploded"),
                other => panic!("unexpected update: {:?}", other),
            }
        }

        monitor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_queue() {
        let f = fixture(vec![QueueSnapshot::new("Q1", 72, 100)]);
        f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 100));

        let level = f.monitor.refresh_queue("Q1").await.unwrap();
        assert_eq!(level, AlertLevel::Warning);
        assert_eq!(f.monitor.monitored_queues()[0].current_depth, 72);

        let missing = f.monitor.refresh_queue("NOPE").await;
        assert!(matches!(missing, Err(SourceError::QueueNotFound(_))));
    }

    #[test]
    fn test_remove_queue() {
        let f = fixture(vec![]);
        assert!(f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 100)));
        assert!(!f.monitor.add_queue(QueueSnapshot::new("Q1", 0, 100)));
        assert!(f.monitor.remove_queue("Q1"));
        assert!(f.monitor.monitored_queues().is_empty());
    }
}
