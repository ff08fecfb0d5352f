//! Well-known label keys attached to every container a stack owns.
//!
//! Current state is always re-queried from the runtime through these labels,
//! so they are the single source of truth for stack membership.

/// Label key holding the stack name.
pub const LABEL_STACK: &str = "stack";

/// Label key holding the service name within the stack.
pub const LABEL_SERVICE: &str = "service";

/// Label key marking a container as created by the reconciler.
pub const LABEL_MANAGED: &str = "managed";

/// Value stored under [`LABEL_MANAGED`].
pub const MANAGED_VALUE: &str = "true";
