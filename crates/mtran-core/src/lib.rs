//! Foundational low-level utilities shared across mtran crates.
//!
//! Provides atomic file-write helpers, content hashing, environment/proxy
//! lookups, and ephemeral port allocation used by the catalog, fetcher,
//! supervisor, and engine cache layers.

pub mod atomic_io;
pub mod env;
pub mod hashing;
pub mod net;
pub mod time_utils;

pub use atomic_io::{write_bytes_atomic, write_text_atomic};
pub use env::{get_bool_env, get_env, proxy_for_scheme};
pub use hashing::{sha256_bytes, sha256_file, verify_sha256_file};
pub use net::allocate_free_port;
pub use time_utils::{current_unix_timestamp, current_unix_timestamp_ms};
