use std::fmt;

use crate::metrics::SkipReason;

/// Whether a reconciliation pulls images first and prunes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    Start,
    Update,
}

impl fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileMode::Start => f.write_str("start"),
            ReconcileMode::Update => f.write_str("update"),
        }
    }
}

/// A service that got no running container in this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedService {
    pub service: String,
    pub reason: SkipReason,
    pub error: String,
}

/// Outcome of `start` / `update`. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Services whose container was created and started, in processing order.
    pub started: Vec<String>,
    pub skipped: Vec<SkippedService>,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn skipped_reason(&self, service: &str) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.service == service)
            .map(|s| s.reason)
    }
}

/// A teardown step that failed for one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownFailure {
    pub container: String,
    /// `stop` or `remove`.
    pub operation: &'static str,
    pub error: String,
}

/// Outcome of `stop`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopReport {
    /// Containers removed.
    pub removed: Vec<String>,
    pub failures: Vec<TeardownFailure>,
}

/// Coarse stack state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackStatus {
    /// At least one labeled container is running.
    Operational,
    Stopped,
}

impl StackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackStatus::Operational => "Operational",
            StackStatus::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_looks_up_skip_reason() {
        let report = ReconcileReport {
            started: vec!["db".into()],
            skipped: vec![SkippedService {
                service: "web".into(),
                reason: SkipReason::Network,
                error: "network 'ghost' not found".into(),
            }],
        };

        assert!(!report.is_complete());
        assert_eq!(report.skipped_reason("web"), Some(SkipReason::Network));
        assert_eq!(report.skipped_reason("db"), None);
    }

    #[test]
    fn status_renders_capitalized_names() {
        assert_eq!(StackStatus::Operational.to_string(), "Operational");
        assert_eq!(StackStatus::Stopped.to_string(), "Stopped");
    }
}
