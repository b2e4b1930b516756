use thiserror::Error;

/// Failure taxonomy for worker process lifecycle operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("worker already running")]
    AlreadyRunning,
    #[error("worker not running")]
    NotRunning,
    #[error("worker binary not found at {0}")]
    BinaryMissing(String),
    #[error("failed to spawn worker: {0}")]
    Spawn(String),
    #[error("worker stop timeout, forced kill")]
    StopTimeout,
}
