//! Metrics collection abstraction for reconciliation and streaming sessions.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are injected via [`crate::RuntimeContext`].
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, SessionOutcome, SkipReason};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
