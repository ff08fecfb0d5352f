//! Prometheus backend for flotilla reconciliation and session metrics.
//!
//! [`PrometheusMetrics`] implements [`flotilla_core::metrics::MetricsBackend`]; inject it with
//! [`flotilla_core::context::RuntimeContext::with_metrics`] and expose [`PrometheusMetrics::gather`]
//! from whatever HTTP server the host process runs.
//!
//! ```rust
//! use std::sync::Arc;
//! use flotilla_core::{context::RuntimeContext, runtime::RuntimeHandle};
//! use flotilla_prometheus::{Encoder, PrometheusMetrics, TextEncoder};
//!
//! # fn demo(runtime: RuntimeHandle) -> Result<(), Box<dyn std::error::Error>> {
//! let metrics = PrometheusMetrics::new()?;
//! let ctx = RuntimeContext::new(runtime).with_metrics(Arc::new(metrics.clone()));
//!
//! let mut body = Vec::new();
//! TextEncoder::new().encode(&metrics.gather(), &mut body)?;
//! # let _ = ctx;
//! # Ok(())
//! # }
//! ```
//!
//! ## Metrics
//! - `flotilla_services_started_total` - Counter
//! - `flotilla_services_skipped_total{reason}` - Counter
//! - `flotilla_runtime_errors_total{operation}` - Counter
//! - `flotilla_sessions_started_total{kind}` - Counter
//! - `flotilla_sessions_completed_total{kind, outcome}` - Counter
//! - `flotilla_session_duration_seconds{kind}` - Histogram
mod backend;
pub use backend::PrometheusMetrics;

pub use prometheus::{Encoder, Registry, TextEncoder};
