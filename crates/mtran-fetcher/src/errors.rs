use thiserror::Error;

/// Failure taxonomy for download and fileset-assembly operations.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("integrity mismatch for {filename}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
    #[error("disk error: {0}")]
    Disk(String),
    #[error("download cancelled")]
    Cancelled,
    #[error("no model found for {from} -> {to} (version: {version:?})")]
    NoModel {
        from: String,
        to: String,
        version: Option<String>,
    },
    #[error("model files missing for {from} -> {to}: {detail}")]
    ModelFilesMissing {
        from: String,
        to: String,
        detail: String,
    },
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        Self::Disk(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<mtran_catalog::CatalogError> for FetchError {
    fn from(err: mtran_catalog::CatalogError) -> Self {
        Self::Network(err.to_string())
    }
}
