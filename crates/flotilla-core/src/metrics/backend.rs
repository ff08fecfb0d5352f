use std::{fmt, sync::Arc};

/// Why a service was left out of a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// A dependency was missing, timed out or the wait was cancelled.
    Dependency,
    /// The named network could not be resolved.
    Network,
    /// Container creation failed.
    Create,
    /// Container start failed.
    Start,
}

impl SkipReason {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            SkipReason::Dependency => "dependency",
            SkipReason::Network => "network",
            SkipReason::Create => "create",
            SkipReason::Start => "start",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// How a streaming session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The runtime stream ended (EOF or read error).
    StreamEnded,
    /// Delivering to the client failed.
    ClientGone,
    /// The session could not be opened.
    OpenFailed,
}

impl SessionOutcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionOutcome::StreamEnded => "stream_ended",
            SessionOutcome::ClientGone => "client_gone",
            SessionOutcome::OpenFailed => "open_failed",
        }
    }
}

/// Backend metrics collection interface.
///
/// All label values are bounded: skip reasons, runtime operation names and session kinds.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a service container created and started.
    fn record_service_started(&self);
    /// Record a service skipped during reconciliation.
    fn record_service_skipped(&self, reason: SkipReason);
    /// Record a best-effort runtime call that failed (`pull`, `prune`, `stop`, `remove`, ...).
    fn record_runtime_error(&self, operation: &str);
    /// Record a log or shell session opening.
    ///
    /// # Arguments
    /// - `kind`: session kind (`logs`, `shell`)
    fn record_session_started(&self, kind: &str);
    /// Record a session ending with outcome and duration.
    ///
    /// # Arguments
    /// - `kind`: session kind (`logs`, `shell`)
    /// - `outcome`: how the session terminated
    /// - `duration_ms`: session lifetime in milliseconds
    fn record_session_completed(&self, kind: &str, outcome: SessionOutcome, duration_ms: u64);
}

/// Shared handle to metrics backend.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
