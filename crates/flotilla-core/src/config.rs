use std::time::Duration;

use serde::{Deserialize, Serialize};

use flotilla_model::TimeoutMs;

/// Reconciler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Upper bound for one dependency to reach its condition.
    pub dependency_timeout_ms: TimeoutMs,
    /// Interval between readiness inspections.
    pub dependency_poll_ms: TimeoutMs,
    /// Grace period given to a container on `stop` before it is killed.
    pub stop_grace_ms: TimeoutMs,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            dependency_timeout_ms: 60_000,
            dependency_poll_ms: 1_000,
            stop_grace_ms: 10_000,
        }
    }
}

impl ReconcileConfig {
    pub fn dependency_timeout(&self) -> Duration {
        Duration::from_millis(self.dependency_timeout_ms)
    }

    /// Poll interval, never below one millisecond.
    pub fn dependency_poll(&self) -> Duration {
        Duration::from_millis(self.dependency_poll_ms.max(1))
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}
