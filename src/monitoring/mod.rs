//! Job Monitoring Module
//!
//! Provides utilities for following submitted jobs until they finish.
//!
//! # Components
//!
//! - [`JobWatcher`]: Concurrent polling of several jobs
//! - [`ExecutionTimeline`]: Observed state changes for timing reports

pub mod timeline;
pub mod watcher;

pub use timeline::{EventType, ExecutionTimeline, TimelineEvent};
pub use watcher::{JobWatcher, WatchReport, DEFAULT_POLL_INTERVAL};
