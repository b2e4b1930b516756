use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use mtran_core::write_bytes_atomic;

use crate::errors::CatalogError;
use crate::types::{CatalogFile, FileRole, LangCode, ModelRecord};
use crate::version::largest_version;

/// The embedded default catalog, written out on first run if no local
/// `records.json` exists yet (grounded on `data.RecordsJson` in the original
/// Go gateway, which embeds the same file via `go:embed`).
const EMBEDDED_DEFAULT_CATALOG: &str =
    include_str!("../../../assets/worker/records.default.json");

const RECORDS_FILE_NAME: &str = "records.json";
pub const DEFAULT_RECORDS_URL: &str =
    "https://remote-settings.mozilla.org/v1/buckets/main/collections/translations-models/records";
pub const ATTACHMENTS_BASE_URL: &str = "https://firefox-settings-attachments.cdn.mozilla.net";

/// Parsed catalog plus the indices that make pair/language lookups cheap.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    records: Vec<ModelRecord>,
    by_pair: HashMap<(String, String), Vec<usize>>,
    languages: HashSet<String>,
    path: PathBuf,
}

impl ModelCatalog {
    /// Loads the catalog from `{config_dir}/records.json`, materializing the
    /// embedded default the first time the gateway runs in this config dir.
    pub fn init(config_dir: &Path) -> Result<Self, CatalogError> {
        let path = config_dir.join(RECORDS_FILE_NAME);
        if !path.exists() {
            write_bytes_atomic(&path, EMBEDDED_DEFAULT_CATALOG.as_bytes())
                .map_err(|err| CatalogError::Unreadable(err.to_string()))?;
        }
        Self::load_from_path(path)
    }

    fn load_from_path(path: PathBuf) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(&path)?;
        let file: CatalogFile = serde_json::from_str(&raw)?;
        Ok(Self::from_records(file.data, path))
    }

    fn from_records(records: Vec<ModelRecord>, path: PathBuf) -> Self {
        let mut by_pair: HashMap<(String, String), Vec<usize>> = HashMap::new();
        let mut languages = HashSet::new();
        for (idx, record) in records.iter().enumerate() {
            by_pair
                .entry((record.from_lang.clone(), record.to_lang.clone()))
                .or_default()
                .push(idx);
            languages.insert(record.from_lang.clone());
            languages.insert(record.to_lang.clone());
        }
        Self {
            records,
            by_pair,
            languages,
            path,
        }
    }

    /// Downloads the remote catalog, overwrites the local file, and reparses it.
    pub async fn refresh(&mut self, url: &str) -> Result<(), CatalogError> {
        let response = reqwest::get(url).await?;
        let response = response
            .error_for_status()
            .map_err(|err| CatalogError::Network(err.to_string()))?;
        let body = response.bytes().await?;
        // Validate before persisting: a malformed remote payload must not
        // clobber a previously-good local catalog.
        let file: CatalogFile = serde_json::from_slice(&body)?;
        write_bytes_atomic(&self.path, &body).map_err(|err| CatalogError::Unreadable(err.to_string()))?;
        *self = Self::from_records(file.data, self.path.clone());
        Ok(())
    }

    pub fn has_pair(&self, from: &str, to: &str) -> bool {
        self.by_pair
            .get(&(from.to_string(), to.to_string()))
            .is_some_and(|records| !records.is_empty())
    }

    pub fn records_for(&self, from: &str, to: &str) -> Vec<&ModelRecord> {
        self.by_pair
            .get(&(from.to_string(), to.to_string()))
            .into_iter()
            .flatten()
            .map(|&idx| &self.records[idx])
            .collect()
    }

    pub fn supported_languages(&self) -> &HashSet<LangCode> {
        &self.languages
    }

    /// Partitions a pair's records by file role and, within each role, keeps
    /// only the record with the largest version.
    pub fn latest_per_role(&self, from: &str, to: &str) -> HashMap<FileRole, &ModelRecord> {
        let mut by_role: HashMap<FileRole, Vec<&ModelRecord>> = HashMap::new();
        for record in self.records_for(from, to) {
            by_role.entry(record.file_type).or_default().push(record);
        }

        let mut result = HashMap::new();
        for (role, candidates) in by_role {
            let versions: Vec<&str> = candidates.iter().map(|r| r.version.as_str()).collect();
            if let Some(best_version) = largest_version(versions) {
                if let Some(record) = candidates.iter().find(|r| r.version == best_version) {
                    result.insert(role, *record);
                }
            }
        }
        result
    }

    /// Exact-version records for a pair, or `None` if no record matches.
    pub fn records_for_version<'a>(
        &'a self,
        from: &str,
        to: &str,
        version: &str,
    ) -> Vec<&'a ModelRecord> {
        self.records_for(from, to)
            .into_iter()
            .filter(|r| r.version == version)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_embedded_default_when_missing() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let catalog = ModelCatalog::init(tempdir.path()).expect("init");
        assert!(tempdir.path().join(RECORDS_FILE_NAME).exists());
        assert!(catalog.has_pair("en", "zh-Hans"));
    }

    #[test]
    fn init_reuses_existing_local_file_without_overwriting() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join(RECORDS_FILE_NAME);
        std::fs::write(&path, r#"{"data":[]}"#).expect("seed");
        let catalog = ModelCatalog::init(tempdir.path()).expect("init");
        assert!(!catalog.has_pair("en", "zh-Hans"));
    }

    #[test]
    fn init_fails_on_malformed_local_file() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join(RECORDS_FILE_NAME);
        std::fs::write(&path, "not json").expect("seed");
        let err = ModelCatalog::init(tempdir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed(_)));
    }

    #[test]
    fn has_pair_reports_embedded_en_zh_hans() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let catalog = ModelCatalog::init(tempdir.path()).expect("init");
        assert!(catalog.has_pair("en", "zh-Hans"));
        assert!(!catalog.has_pair("zh-Hans", "ja"));
    }

    #[test]
    fn latest_per_role_is_order_independent() {
        let records = vec![
            make_record("en", "x", "1.0.0", FileRole::Model),
            make_record("en", "x", "2.1", FileRole::Model),
            make_record("en", "x", "2.0", FileRole::Model),
        ];
        let reversed: Vec<_> = records.iter().cloned().rev().collect();

        let forward = ModelCatalog::from_records(records, PathBuf::new());
        let backward = ModelCatalog::from_records(reversed, PathBuf::new());

        let forward_best = forward.latest_per_role("en", "x");
        let backward_best = backward.latest_per_role("en", "x");
        assert_eq!(
            forward_best.get(&FileRole::Model).map(|r| r.version.as_str()),
            Some("2.1")
        );
        assert_eq!(
            backward_best.get(&FileRole::Model).map(|r| r.version.as_str()),
            Some("2.1")
        );
    }

    #[test]
    fn latest_per_role_partitions_by_role_independently() {
        let records = vec![
            make_record("en", "x", "1.0", FileRole::Model),
            make_record("en", "x", "3.0", FileRole::Lex),
        ];
        let catalog = ModelCatalog::from_records(records, PathBuf::new());
        let best = catalog.latest_per_role("en", "x");
        assert_eq!(best.get(&FileRole::Model).map(|r| r.version.as_str()), Some("1.0"));
        assert_eq!(best.get(&FileRole::Lex).map(|r| r.version.as_str()), Some("3.0"));
    }

    fn make_record(from: &str, to: &str, version: &str, role: FileRole) -> ModelRecord {
        ModelRecord {
            hash: None,
            name: format!("{from}-{to}-{}", role.as_str()),
            schema: 1,
            to_lang: to.to_string(),
            version: version.to_string(),
            file_type: role,
            from_lang: from.to_string(),
            attachment: crate::types::Attachment {
                hash: "0".repeat(64),
                size: 1,
                filename: format!("{}.bin", role.as_str()),
                location: format!("{from}-{to}/{}.bin", role.as_str()),
                mimetype: "application/octet-stream".to_string(),
            },
            id: format!("{from}-{to}-{version}-{}", role.as_str()),
        }
    }
}
