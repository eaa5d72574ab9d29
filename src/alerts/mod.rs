//! Threshold-based alerting on queue depths
//!
//! [`evaluate`] classifies a depth reading, [`AlertTracker`] remembers the
//! level of every queue and records each change exactly once.

pub mod config;
pub mod evaluator;
pub mod notifier;
pub mod tracker;

pub use config::{AlertLevel, ThresholdConfig, ThresholdRegistry};
pub use evaluator::{evaluate, resolve_threshold};
pub use notifier::{LogNotifier, SoundError, SoundNotifier, TerminalBell};
pub use tracker::{AlertEvent, AlertTracker};
