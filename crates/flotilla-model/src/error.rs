use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown restart policy: {0}")]
    UnknownRestart(String),

    #[error("unknown dependency condition: {0}")]
    UnknownCondition(String),

    #[error("unknown port protocol: {0}")]
    UnknownProtocol(String),

    #[error("unknown volume type: {0}")]
    UnknownVolumeKind(String),

    #[error("empty network reference")]
    EmptyNetwork,
}

pub type ModelResult<T> = Result<T, ModelError>;
