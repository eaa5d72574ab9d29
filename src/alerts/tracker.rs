//! Per-queue alert level tracking

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::config::{AlertLevel, ThresholdConfig};
use super::evaluator::evaluate;
use super::notifier::SoundNotifier;
use crate::source::QueueSnapshot;

/// Recorded change of a queue's alert level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub queue_name: String,
    pub depth: u32,
    pub max_depth: u32,
    pub from_level: AlertLevel,
    pub to_level: AlertLevel,
    pub timestamp: DateTime<Utc>,
}

impl std::fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: {} -> {} (depth: {}/{})",
            self.timestamp.to_rfc3339(),
            self.queue_name,
            self.from_level,
            self.to_level,
            self.depth,
            self.max_depth
        )
    }
}

/// Current alert level per queue plus the transition history.
///
/// Safe to share between the monitor worker and readers; checks for
/// different queues do not block each other.
pub struct AlertTracker {
    /// Level per queue, created on first check
    levels: DashMap<String, AlertLevel>,
    /// Append-only transition log
    history: RwLock<Vec<AlertEvent>>,
    sound_enabled: AtomicBool,
    notifier: Arc<dyn SoundNotifier>,
}

impl AlertTracker {
    /// Create a tracker with sound enabled
    pub fn new(notifier: Arc<dyn SoundNotifier>) -> Self {
        Self {
            levels: DashMap::new(),
            history: RwLock::new(Vec::new()),
            sound_enabled: AtomicBool::new(true),
            notifier,
        }
    }

    /// Evaluate a snapshot and record a transition if the level changed.
    ///
    /// Repeating an identical snapshot is a no-op.
    pub fn check_queue(&self, snapshot: &QueueSnapshot, config: &ThresholdConfig) -> AlertLevel {
        let new_level = evaluate(config, snapshot.current_depth, snapshot.max_depth);

        // Compare, swap and record under the entry lock so concurrent checks
        // of one queue append a consistent from/to chain. Lock order is entry
        // then history.
        let previous = {
            let mut level = self
                .levels
                .entry(snapshot.queue_name.clone())
                .or_insert(AlertLevel::None);
            let previous = *level;
            if previous == new_level {
                return new_level;
            }
            *level = new_level;

            self.history.write().push(AlertEvent {
                queue_name: snapshot.queue_name.clone(),
                depth: snapshot.current_depth,
                max_depth: snapshot.max_depth,
                from_level: previous,
                to_level: new_level,
                timestamp: Utc::now(),
            });
            previous
        };

        tracing::info!(
            queue = %snapshot.queue_name,
            depth = snapshot.current_depth,
            max_depth = snapshot.max_depth,
            "Alert level changed: {} -> {}",
            previous,
            new_level
        );

        if new_level != AlertLevel::None && self.is_sound_enabled() {
            self.play_sound(new_level);
        }

        new_level
    }

    fn play_sound(&self, level: AlertLevel) {
        let result = match level {
            AlertLevel::Critical => self.notifier.play_alert(),
            AlertLevel::Warning => self.notifier.play_warning(),
            AlertLevel::None => Ok(()),
        };

        if let Err(e) = result {
            tracing::error!(error = %e, alert_level = %level, "Failed to play alert sound");
        }
    }

    /// Current level for a queue (None if never checked)
    pub fn current_level(&self, queue_name: &str) -> AlertLevel {
        self.levels
            .get(queue_name)
            .map(|l| *l)
            .unwrap_or_default()
    }

    /// Copy of every tracked level
    pub fn current_levels(&self) -> HashMap<String, AlertLevel> {
        self.levels
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }

    /// Full transition history, oldest first
    pub fn history(&self) -> Vec<AlertEvent> {
        self.history.read().clone()
    }

    /// Transition history for one queue, oldest first
    pub fn history_for(&self, queue_name: &str) -> Vec<AlertEvent> {
        self.history
            .read()
            .iter()
            .filter(|e| e.queue_name == queue_name)
            .cloned()
            .collect()
    }

    /// Drop recorded events; current levels are kept
    pub fn clear_alert_history(&self) {
        self.history.write().clear();
        tracing::info!("Alert history cleared");
    }

    /// Forget a queue's level so its next check starts from None.
    ///
    /// No event is recorded, and a later check at an unchanged elevated depth
    /// records a fresh None -> Warning/Critical transition.
    pub fn clear_queue_alert(&self, queue_name: &str) {
        self.levels.remove(queue_name);
        tracing::info!(queue = %queue_name, "Cleared alert for queue");
    }

    /// Whether alert transitions play a sound
    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::SeqCst)
    }

    /// Enable or disable alert sounds
    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::SeqCst);
        tracing::info!("Sound alerts {}", if enabled { "enabled" } else { "disabled" });
    }
}

impl std::fmt::Debug for AlertTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertTracker")
            .field("queues", &self.levels.len())
            .field("events", &self.history.read().len())
            .field("sound_enabled", &self.is_sound_enabled())
            .finish()
    }
}
