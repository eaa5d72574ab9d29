//! Threshold configuration types

use std::collections::HashMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Alert severity, ordered None < Warning < Critical
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    #[default]
    None,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertLevel::None => "NONE",
            AlertLevel::Warning => "WARNING",
            AlertLevel::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// Per-queue depth thresholds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThresholdConfig {
    /// Queue this config applies to
    pub queue_name: String,
    /// Warning threshold (percent of max depth or absolute depth)
    pub warning_threshold: u32,
    /// Critical threshold (percent of max depth or absolute depth)
    pub critical_threshold: u32,
    /// Whether the warning threshold is a percentage
    pub warning_threshold_percentage: bool,
    /// Whether the critical threshold is a percentage
    pub critical_threshold_percentage: bool,
    /// Whether alerting is enabled for this queue
    pub enabled: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            queue_name: String::new(),
            warning_threshold: 70,
            critical_threshold: 90,
            warning_threshold_percentage: true,
            critical_threshold_percentage: true,
            enabled: true,
        }
    }
}

impl ThresholdConfig {
    /// Default percentage thresholds for a queue
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            ..Default::default()
        }
    }

    /// Set percentage thresholds
    pub fn with_percentages(mut self, warning: u32, critical: u32) -> Self {
        self.warning_threshold = warning;
        self.critical_threshold = critical;
        self.warning_threshold_percentage = true;
        self.critical_threshold_percentage = true;
        self
    }

    /// Set absolute depth thresholds
    pub fn with_absolute(mut self, warning: u32, critical: u32) -> Self {
        self.warning_threshold = warning;
        self.critical_threshold = critical;
        self.warning_threshold_percentage = false;
        self.critical_threshold_percentage = false;
        self
    }

    /// Set enabled state
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Threshold configs keyed by queue name, shared between the control side and
/// the monitor worker
#[derive(Debug, Default)]
pub struct ThresholdRegistry {
    configs: DashMap<String, ThresholdConfig>,
}

impl ThresholdRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from saved configs
    pub fn from_map(configs: HashMap<String, ThresholdConfig>) -> Self {
        Self {
            configs: configs.into_iter().collect(),
        }
    }

    /// Config for a queue, or the defaults when none is registered
    pub fn get_or_default(&self, queue_name: &str) -> ThresholdConfig {
        self.configs
            .get(queue_name)
            .map(|c| c.value().clone())
            .unwrap_or_else(|| ThresholdConfig::new(queue_name))
    }

    /// Register a config under its queue name, returning the previous one
    pub fn set(&self, config: ThresholdConfig) -> Option<ThresholdConfig> {
        self.configs.insert(config.queue_name.clone(), config)
    }

    /// Remove a queue's config so it falls back to the defaults
    pub fn remove(&self, queue_name: &str) -> Option<ThresholdConfig> {
        self.configs.remove(queue_name).map(|(_, c)| c)
    }

    /// Copy of every registered config, for saving
    pub fn to_map(&self) -> HashMap<String, ThresholdConfig> {
        self.configs
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
