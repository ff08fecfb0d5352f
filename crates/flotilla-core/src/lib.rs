pub mod config;
pub mod context;
pub mod deps;
pub mod error;
pub mod metrics;
pub mod naming;
pub mod network;
pub mod reconcile;
pub mod runtime;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub mod prelude {
    pub use crate::config::ReconcileConfig;
    pub use crate::context::RuntimeContext;
    pub use crate::error::CoreError;
    pub use crate::reconcile::{ReconcileMode, ReconcileReport, StackReconciler, StackStatus, StopReport};
    pub use crate::runtime::{RuntimeClient, RuntimeError, RuntimeHandle};
}
