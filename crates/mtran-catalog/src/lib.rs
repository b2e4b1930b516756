//! Model catalog: parses `records.json`, tracks per-pair/per-role entries,
//! and picks the newest version within each (from, to, role) group.

pub mod catalog;
pub mod errors;
pub mod types;
pub mod version;

pub use catalog::{ModelCatalog, ATTACHMENTS_BASE_URL, DEFAULT_RECORDS_URL};
pub use errors::CatalogError;
pub use types::{Attachment, CatalogFile, FileRole, LangCode, ModelRecord, AUTO_LANG, ENGLISH};
pub use version::{compare_versions, largest_version};
