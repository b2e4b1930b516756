//! Directory-scoped artifact downloader: generic `fetch`, plus the
//! catalog-aware `download_model`/`get_model_files` pair used to materialize
//! and locate a translation pair's on-disk files.

pub mod cancel;
pub mod errors;
pub mod fetcher;
pub mod model;

pub use cancel::CancelSignal;
pub use errors::FetchError;
pub use fetcher::{fetch, FetchOptions};
pub use model::{download_model, get_model_files, Fileset, ATTACHMENTS_BASE_URL};
