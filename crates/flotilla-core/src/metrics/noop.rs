use crate::metrics::backend::{MetricsBackend, SessionOutcome, SkipReason};

/// No-op metrics backend that compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMetrics;

impl MetricsBackend for NoOpMetrics {
    #[inline(always)]
    fn record_service_started(&self) {}

    #[inline(always)]
    fn record_service_skipped(&self, _: SkipReason) {}

    #[inline(always)]
    fn record_runtime_error(&self, _: &str) {}

    #[inline(always)]
    fn record_session_started(&self, _: &str) {}

    #[inline(always)]
    fn record_session_completed(&self, _: &str, _: SessionOutcome, _: u64) {}
}
