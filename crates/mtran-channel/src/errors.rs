use thiserror::Error;

/// Failure taxonomy for the persistent worker channel connection.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("not connected")]
    NotConnected,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error (code {code}): {msg}")]
    Protocol { code: i64, msg: String },
}
