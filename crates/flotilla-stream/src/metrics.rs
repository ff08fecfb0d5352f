//! Metric labels for streaming sessions.

use flotilla_core::metrics::SessionOutcome;

use crate::StreamError;

/// Log-follow session kind identifier for metrics.
pub const SESSION_KIND_LOGS: &str = "logs";

/// Interactive shell session kind identifier for metrics.
pub const SESSION_KIND_SHELL: &str = "shell";

/// Convert a session error to its outcome label.
pub fn error_outcome(error: &StreamError) -> SessionOutcome {
    match error {
        StreamError::ChannelClosed => SessionOutcome::ClientGone,
        _ => SessionOutcome::OpenFailed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_channel_maps_to_client_gone() {
        assert_eq!(error_outcome(&StreamError::ChannelClosed), SessionOutcome::ClientGone);
    }

    #[test]
    fn missing_containers_map_to_open_failed() {
        let err = StreamError::NoContainers("s".into());
        assert_eq!(error_outcome(&err), SessionOutcome::OpenFailed);
    }
}
