use std::fmt;

use crate::{
    metrics::{MetricsHandle, noop_metrics},
    runtime::{RuntimeClient, RuntimeHandle},
};

/// Shared dependencies handed to the reconciler and streaming sessions.
#[derive(Clone)]
pub struct RuntimeContext {
    runtime: RuntimeHandle,
    metrics: MetricsHandle,
}

impl RuntimeContext {
    /// Create a context over `runtime` with no-op metrics.
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self {
            runtime,
            metrics: noop_metrics(),
        }
    }

    /// Borrow the runtime client.
    pub fn runtime(&self) -> &dyn RuntimeClient {
        self.runtime.as_ref()
    }

    /// Get a clonable handle to the runtime client.
    pub fn runtime_handle(&self) -> &RuntimeHandle {
        &self.runtime
    }

    /// Get a clonable handle to the metrics backend.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    /// Replace the metrics backend and return updated context.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }
}

impl fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("runtime", &"<handle>")
            .field("metrics", &"<handle>")
            .finish()
    }
}
