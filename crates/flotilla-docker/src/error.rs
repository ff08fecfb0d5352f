use bollard::errors::Error;

use flotilla_core::runtime::RuntimeError;

/// Map an engine error onto the runtime error kinds the core reacts to.
pub fn runtime_error(err: Error) -> RuntimeError {
    match err {
        Error::DockerResponseServerError {
            status_code: 404,
            message,
        } => RuntimeError::NotFound(message),
        Error::DockerResponseServerError {
            status_code: 409,
            message,
        } => RuntimeError::Conflict(message),
        Error::IOError { err } => RuntimeError::Io(err),
        other => RuntimeError::Api(other.to_string()),
    }
}
