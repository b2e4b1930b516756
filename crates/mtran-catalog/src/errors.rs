use thiserror::Error;

/// Failure taxonomy for catalog loading/refresh/query operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file unreadable: {0}")]
    Unreadable(String),
    #[error("catalog file malformed: {0}")]
    Malformed(String),
    #[error("network error refreshing catalog: {0}")]
    Network(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        Self::Unreadable(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
