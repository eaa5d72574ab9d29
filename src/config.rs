use std::path::PathBuf;

use crate::monitor::DEFAULT_REFRESH_INTERVAL_MS;

/// Runtime configuration for the mqwatch binary
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Directory holding connections, thresholds and hierarchy documents
    pub config_dir: PathBuf,
    /// Base URL of the queue depth endpoint
    pub source_url: String,
    /// Requested refresh interval (the monitor clamps it)
    pub refresh_interval_ms: u64,
    /// Whether alert transitions ring the terminal bell
    pub sound_enabled: bool,
    /// Queues to monitor; empty means every queue the source reports
    pub queue_filter: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            source_url: "http://127.0.0.1:9443/mq".to_string(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            sound_enabled: true,
            queue_filter: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read configuration from environment variables
    /// MQWATCH_CONFIG_DIR=/home/me/.mqwatch
    /// MQWATCH_SOURCE_URL=http://mq-admin:9443/mq
    /// MQWATCH_REFRESH_MS=5000
    /// MQWATCH_SOUND=true
    /// MQWATCH_QUEUES=DEV.QUEUE.1,DEV.QUEUE.2
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let config_dir = lookup("MQWATCH_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.config_dir);
        let source_url = lookup("MQWATCH_SOURCE_URL").unwrap_or(defaults.source_url);
        let refresh_interval_ms = lookup("MQWATCH_REFRESH_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.refresh_interval_ms);
        let sound_enabled = lookup("MQWATCH_SOUND")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(defaults.sound_enabled);
        let queue_filter = lookup("MQWATCH_QUEUES")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|q| !q.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            config_dir,
            source_url,
            refresh_interval_ms,
            sound_enabled,
            queue_filter,
        }
    }

    /// Whether a queue passes the configured filter
    pub fn wants_queue(&self, queue_name: &str) -> bool {
        self.queue_filter.is_empty() || self.queue_filter.iter().any(|q| q == queue_name)
    }
}

/// `$HOME/.mqwatch`, or `./.mqwatch` when HOME is unset
pub fn default_config_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mqwatch")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.refresh_interval_ms, 5_000);
        assert!(config.sound_enabled);
        assert!(config.queue_filter.is_empty());
        assert!(config.wants_queue("ANY.QUEUE"));
        assert!(config.config_dir.ends_with(".mqwatch"));
    }

    #[test]
    fn test_from_vars() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MQWATCH_CONFIG_DIR", "/tmp/mqw"),
            ("MQWATCH_SOURCE_URL", "http://mq:9443/admin"),
            ("MQWATCH_REFRESH_MS", "250"),
            ("MQWATCH_SOUND", "0"),
            ("MQWATCH_QUEUES", "Q1, Q2,,"),
        ]));

        assert_eq!(config.config_dir, PathBuf::from("/tmp/mqw"));
        assert_eq!(config.source_url, "http://mq:9443/admin");
        assert_eq!(config.refresh_interval_ms, 250);
        assert!(!config.sound_enabled);
        assert_eq!(config.queue_filter, vec!["Q1", "Q2"]);
        assert!(config.wants_queue("Q2"));
        assert!(!config.wants_queue("Q3"));
    }

    #[test]
    fn test_bad_interval_falls_back() {
        let config = AppConfig::from_lookup(lookup(&[("MQWATCH_REFRESH_MS", "soon")]));
        assert_eq!(config.refresh_interval_ms, 5_000);
    }
}
