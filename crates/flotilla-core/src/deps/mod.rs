//! Dependency ordering and readiness gating.
//!
//! [`DependencyGraph`] orders a project's services so that dependencies come first;
//! [`ReadinessWaiter`] blocks a dependent until each dependency reached its condition.
mod graph;
pub use graph::{CycleEdge, DependencyGraph, DependencyOrder};

mod waiter;
pub use waiter::{ReadinessWaiter, WaitOutcome, is_satisfied};
