//! Threshold evaluation

use super::config::{AlertLevel, ThresholdConfig};

/// Absolute depth a threshold resolves to for a given max depth
pub fn resolve_threshold(threshold: u32, percentage: bool, max_depth: u32) -> u32 {
    if percentage {
        (f64::from(max_depth) * f64::from(threshold) / 100.0).round() as u32
    } else {
        threshold
    }
}

/// Classify a queue depth against its thresholds.
///
/// Boundaries are inclusive. With percentage thresholds and a max depth of 0
/// both thresholds resolve to 0, so every depth is Critical.
pub fn evaluate(config: &ThresholdConfig, depth: u32, max_depth: u32) -> AlertLevel {
    if !config.enabled {
        return AlertLevel::None;
    }

    let critical = resolve_threshold(
        config.critical_threshold,
        config.critical_threshold_percentage,
        max_depth,
    );
    let warning = resolve_threshold(
        config.warning_threshold,
        config.warning_threshold_percentage,
        max_depth,
    );

    if depth >= critical {
        AlertLevel::Critical
    } else if depth >= warning {
        AlertLevel::Warning
    } else {
        AlertLevel::None
    }
}
