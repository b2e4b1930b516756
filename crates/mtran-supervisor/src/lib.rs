//! Worker process supervision: materializes the embedded worker binary once
//! per process and manages the spawn/stop/restart/cleanup lifecycle of
//! individual worker instances.

pub mod binary;
pub mod errors;
pub mod worker;

pub use binary::ensure_worker_binary;
pub use errors::SupervisorError;
pub use worker::{Worker, WorkerArgs, WorkerStatus};
