//! Queue depth monitoring
//!
//! [`MonitorLoop`] owns one background task that periodically refreshes the
//! monitored queues from a [`QueueDataSource`](crate::source::QueueDataSource),
//! runs every queue through the [`AlertTracker`](crate::alerts::AlertTracker)
//! and hands the refreshed list to a [`MonitorListener`].

pub mod listener;
pub mod queues;
pub mod worker;

pub use listener::{drain_updates, ChannelListener, MonitorError, MonitorListener, MonitorUpdate};
pub use queues::MonitoredQueues;
pub use worker::{
    MonitorLoop, MonitorState, DEFAULT_REFRESH_INTERVAL_MS, MAX_REFRESH_INTERVAL_MS,
    MIN_REFRESH_INTERVAL_MS,
};
