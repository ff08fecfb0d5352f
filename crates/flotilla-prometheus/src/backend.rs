use std::sync::Arc;

use prometheus::{Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry, proto::MetricFamily};

use flotilla_core::metrics::{MetricsBackend, SessionOutcome, SkipReason};

const NAMESPACE: &str = "flotilla";

/// Prometheus metrics backend.
///
/// Labels stay low-cardinality: skip reasons, runtime operation names, session kinds and outcomes.
/// Stack and service names are deliberately not labels.
#[derive(Clone)]
pub struct PrometheusMetrics {
    services_started: Counter,
    services_skipped: CounterVec,
    runtime_errors: CounterVec,
    sessions_started: CounterVec,
    sessions_completed: CounterVec,
    session_duration: HistogramVec,
    registry: Arc<Registry>,
}

impl PrometheusMetrics {
    /// Register all collectors in `registry`.
    pub fn new_with_registry(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let services_started = Counter::with_opts(
            Opts::new("services_started_total", "Service containers created and started")
                .namespace(NAMESPACE),
        )?;
        registry.register(Box::new(services_started.clone()))?;

        let services_skipped = CounterVec::new(
            Opts::new("services_skipped_total", "Services skipped during reconciliation")
                .namespace(NAMESPACE),
            &["reason"],
        )?;
        registry.register(Box::new(services_skipped.clone()))?;

        let runtime_errors = CounterVec::new(
            Opts::new("runtime_errors_total", "Best-effort runtime calls that failed")
                .namespace(NAMESPACE),
            &["operation"],
        )?;
        registry.register(Box::new(runtime_errors.clone()))?;

        let sessions_started = CounterVec::new(
            Opts::new("sessions_started_total", "Log and shell sessions opened")
                .namespace(NAMESPACE),
            &["kind"],
        )?;
        registry.register(Box::new(sessions_started.clone()))?;

        let sessions_completed = CounterVec::new(
            Opts::new("sessions_completed_total", "Log and shell sessions ended")
                .namespace(NAMESPACE),
            &["kind", "outcome"],
        )?;
        registry.register(Box::new(sessions_completed.clone()))?;

        let session_duration = HistogramVec::new(
            HistogramOpts::new("session_duration_seconds", "Session lifetime in seconds")
                .namespace(NAMESPACE)
                .buckets(vec![0.1, 1.0, 10.0, 60.0, 300.0, 900.0, 3600.0, 14400.0]),
            &["kind"],
        )?;
        registry.register(Box::new(session_duration.clone()))?;

        Ok(Self {
            services_started,
            services_skipped,
            runtime_errors,
            sessions_started,
            sessions_completed,
            session_duration,
            registry,
        })
    }

    /// Backend with its own registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::new_with_registry(Arc::new(Registry::new()))
    }

    /// Gather all metric families for exposition.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }
}

impl MetricsBackend for PrometheusMetrics {
    fn record_service_started(&self) {
        self.services_started.inc();
    }

    fn record_service_skipped(&self, reason: SkipReason) {
        self.services_skipped
            .with_label_values(&[reason.as_label()])
            .inc();
    }

    fn record_runtime_error(&self, operation: &str) {
        self.runtime_errors.with_label_values(&[operation]).inc();
    }

    fn record_session_started(&self, kind: &str) {
        self.sessions_started.with_label_values(&[kind]).inc();
    }

    fn record_session_completed(&self, kind: &str, outcome: SessionOutcome, duration_ms: u64) {
        self.sessions_completed
            .with_label_values(&[kind, outcome.as_label()])
            .inc();
        self.session_duration
            .with_label_values(&[kind])
            .observe(duration_ms as f64 / 1000.0);
    }
}
