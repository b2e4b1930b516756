//! Process-wide `(from, to) -> Engine` cache: creates, idle-evicts, and
//! fault-recovers the worker process + channel connection backing each
//! translation pair.

pub mod cache;
pub mod errors;
pub mod handle;

pub use cache::{EngineCache, EngineCacheConfig};
pub use errors::EngineError;
pub use handle::EngineHandle;
