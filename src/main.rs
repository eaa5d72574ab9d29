//! mqwatch monitor
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - MQWATCH_CONFIG_DIR: Directory for connections/thresholds/hierarchy (default: $HOME/.mqwatch)
//! - MQWATCH_SOURCE_URL: Base URL of the queue depth endpoint (default: http://127.0.0.1:9443/mq)
//! - MQWATCH_REFRESH_MS: Refresh interval, clamped to 1000..=60000 (default: 5000)
//! - MQWATCH_SOUND: Ring the terminal bell on alerts (default: true)
//! - MQWATCH_QUEUES: Comma-separated queues to monitor (default: all)
//! - RUST_LOG: Log level (default: mqwatch=info)

use std::sync::Arc;
use std::time::Duration;

use mqwatch::alerts::{AlertLevel, AlertTracker, LogNotifier, SoundNotifier, TerminalBell, ThresholdRegistry};
use mqwatch::monitor::{ChannelListener, MonitorLoop, MonitorUpdate};
use mqwatch::source::{HttpQueueSource, QueueDataSource, QueueSnapshot};
use mqwatch::store::{ConfigStore, JsonConfigStore, StoreError};
use mqwatch::{AppConfig, HierarchyStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mqwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    tracing::info!("mqwatch {} configuration:", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Config dir: {}", config.config_dir.display());
    tracing::info!("  Source: {}", config.source_url);
    tracing::info!("  Refresh interval: {} ms", config.refresh_interval_ms);
    tracing::info!("  Sound: {}", if config.sound_enabled { "on" } else { "off" });
    if !config.queue_filter.is_empty() {
        tracing::info!("  Queues: {}", config.queue_filter.join(", "));
    }

    let store = JsonConfigStore::new(&config.config_dir)?;
    let hierarchy = load_or_create_hierarchy(&store)?;

    tracing::info!("Hierarchy ({} nodes):", hierarchy.len());
    for (depth, node) in hierarchy.walk() {
        let marker = if node.is_folder() { "+" } else { "-" };
        tracing::info!("  {}{} {}", "  ".repeat(depth), marker, node.name);
    }

    let thresholds = Arc::new(ThresholdRegistry::from_map(store.load_thresholds()?));
    let notifier: Arc<dyn SoundNotifier> = if config.sound_enabled {
        Arc::new(TerminalBell::new())
    } else {
        Arc::new(LogNotifier)
    };
    let tracker = Arc::new(AlertTracker::new(notifier));
    tracker.set_sound_enabled(config.sound_enabled);

    let source = Arc::new(HttpQueueSource::new(config.source_url.clone())?);
    let monitor = MonitorLoop::new(source.clone(), Arc::clone(&tracker), thresholds);
    monitor.set_refresh_interval(config.refresh_interval_ms);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let initial = tokio::select! {
        queues = fetch_initial_queues(source.as_ref(), &config, monitor.refresh_interval()) => queues,
        _ = &mut shutdown => {
            tracing::info!("Shutting down before the first queue fetch");
            return Ok(());
        }
    };
    monitor.set_monitored_queues(initial);

    let (listener, mut updates) = ChannelListener::new();
    monitor.set_listener(Arc::new(listener));
    let handle = monitor.start();

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(MonitorUpdate::QueuesUpdated(queues)) => {
                    let mut alerting = 0;
                    for queue in &queues {
                        let level = tracker.current_level(&queue.queue_name);
                        if level != AlertLevel::None {
                            alerting += 1;
                            tracing::warn!(
                                queue = %queue.queue_name,
                                alert_level = %level,
                                "{} at {:.1}%",
                                queue,
                                queue.depth_percentage()
                            );
                        }
                    }
                    tracing::info!("Refreshed {} queues, {} alerting", queues.len(), alerting);
                }
                Some(MonitorUpdate::Error(e)) => {
                    tracing::warn!(error = %e, "Monitor tick failed");
                }
                None => break,
            },
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    monitor.stop();
    if let Err(e) = handle.await {
        tracing::error!(error = %e, "Monitor task ended abnormally");
    }

    tracing::info!("Recorded {} alert transitions", tracker.history().len());
    store.save_hierarchy(&hierarchy)?;

    Ok(())
}

/// First queue list from the source, retried until the source answers
async fn fetch_initial_queues(
    source: &dyn QueueDataSource,
    config: &AppConfig,
    retry: Duration,
) -> Vec<QueueSnapshot> {
    loop {
        match source.get_all_snapshots().await {
            Ok(queues) => {
                return queues
                    .into_iter()
                    .filter(|q| config.wants_queue(&q.queue_name))
                    .collect();
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source = %config.source_url,
                    retry_ms = retry.as_millis() as u64,
                    "Initial queue fetch failed, retrying"
                );
                tokio::time::sleep(retry).await;
            }
        }
    }
}

/// Saved hierarchy, or a fresh one built from the saved connections
fn load_or_create_hierarchy(store: &JsonConfigStore) -> Result<HierarchyStore, StoreError> {
    match store.load_hierarchy() {
        Ok(Some(hierarchy)) => return Ok(hierarchy),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(error = %e, "Saved hierarchy unusable, rebuilding from connections");
        }
    }

    let connections = store.load_connections()?;
    let hierarchy = store.create_default_hierarchy(&connections);
    store.save_hierarchy(&hierarchy)?;
    Ok(hierarchy)
}
