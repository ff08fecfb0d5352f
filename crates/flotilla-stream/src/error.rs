use thiserror::Error;

use flotilla_core::runtime::RuntimeError;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("no running containers in stack '{0}'")]
    NoContainers(String),

    #[error("client channel closed")]
    ChannelClosed,

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
