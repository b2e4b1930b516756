use thiserror::Error;

/// Failure taxonomy for engine creation and retrieval.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] mtran_catalog::CatalogError),
    #[error(transparent)]
    Fetch(#[from] mtran_fetcher::FetchError),
    #[error(transparent)]
    Supervisor(#[from] mtran_supervisor::SupervisorError),
    #[error(transparent)]
    Channel(#[from] mtran_channel::ChannelError),
    #[error("no model available for {from} -> {to}")]
    NoModel { from: String, to: String },
    #[error("model files missing for {from} -> {to}")]
    ModelFilesMissing { from: String, to: String },
    #[error("failed to allocate a port: {0}")]
    PortAllocation(String),
    #[error("engine never became ready")]
    NotReady,
}
