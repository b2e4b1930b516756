use thiserror::Error;

/// Failure taxonomy for the translation planner.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Engine(#[from] mtran_engine::EngineError),
    #[error(transparent)]
    Channel(#[from] mtran_channel::ChannelError),
    #[error("failed to detect source language")]
    DetectionFailed,
    #[error("invalid input: {0}")]
    InputError(String),
}

/// Substrings that mark a worker error as fatal: the worker is gone and the
/// request should be retried once against a freshly recovered engine.
/// Timeouts and plain transport hiccups are deliberately excluded — a
/// timeout is surfaced as-is (the caller set the deadline), and a retry only
/// makes sense once the worker itself has reported it is actually gone.
const FATAL_MARKERS: &[&str] = &[
    "channel disconnected",
    "send/receive failure",
    "module closed",
    "exit_code",
    "wasm error",
    "invalid table access",
];

/// Classifies whether an error means "the worker is gone" and should trigger
/// fault recovery plus a single retry.
pub fn is_fatal(err: &PlannerError) -> bool {
    let text = err.to_string().to_ascii_lowercase();
    FATAL_MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_module_closed_as_fatal() {
        let err = PlannerError::Channel(mtran_channel::ChannelError::Protocol {
            code: 500,
            msg: "module closed unexpectedly".to_string(),
        });
        assert!(is_fatal(&err));
    }

    #[test]
    fn recognizes_exit_code_as_fatal() {
        let err = PlannerError::Channel(mtran_channel::ChannelError::Transport(
            "worker process exit_code=1".to_string(),
        ));
        assert!(is_fatal(&err));
    }

    #[test]
    fn timeouts_are_not_fatal() {
        let err = PlannerError::Channel(mtran_channel::ChannelError::Timeout);
        assert!(!is_fatal(&err));
    }

    #[test]
    fn plain_disconnects_are_not_fatal() {
        let err = PlannerError::Channel(mtran_channel::ChannelError::NotConnected);
        assert!(!is_fatal(&err));
    }

    #[test]
    fn input_errors_are_not_fatal() {
        let err = PlannerError::InputError("unsupported pair".to_string());
        assert!(!is_fatal(&err));
    }
}
