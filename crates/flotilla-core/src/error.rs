use thiserror::Error;

use crate::runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network '{name}' not found; available networks: {known:?}")]
    NetworkNotFound { name: String, known: Vec<String> },

    #[error("dependency '{0}' not found in project")]
    DependencyNotFound(String),

    #[error("timeout waiting for dependency '{dependency}' after {waited_ms}ms")]
    DependencyTimeout { dependency: String, waited_ms: u64 },

    #[error("dependency wait cancelled")]
    Cancelled,

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}
