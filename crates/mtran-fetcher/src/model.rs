use std::path::{Path, PathBuf};

use mtran_catalog::{FileRole, ModelCatalog};

use crate::cancel::CancelSignal;
use crate::errors::FetchError;
use crate::fetcher::{fetch, FetchOptions};

pub const ATTACHMENTS_BASE_URL: &str = mtran_catalog::ATTACHMENTS_BASE_URL;

/// The four on-disk files a worker needs to load one (from, to) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fileset {
    pub model: PathBuf,
    pub lex: PathBuf,
    pub vocab_src: PathBuf,
    pub vocab_trg: PathBuf,
}

fn pair_dir(model_dir: &Path, from: &str, to: &str) -> PathBuf {
    model_dir.join(format!("{from}_{to}"))
}

/// Downloads every file needed for a (from, to) pair, at `version` if given,
/// else the newest version per file role.
pub async fn download_model(
    catalog: &ModelCatalog,
    model_dir: &Path,
    from: &str,
    to: &str,
    version: Option<&str>,
    cancel: Option<&CancelSignal>,
) -> Result<(), FetchError> {
    let records = catalog.records_for(from, to);
    if records.is_empty() {
        return Err(FetchError::NoModel {
            from: from.to_string(),
            to: to.to_string(),
            version: version.map(str::to_string),
        });
    }

    let targets: Vec<_> = match version {
        Some(v) => {
            let matched: Vec<_> = records.into_iter().filter(|r| r.version == v).collect();
            if matched.is_empty() {
                return Err(FetchError::NoModel {
                    from: from.to_string(),
                    to: to.to_string(),
                    version: Some(v.to_string()),
                });
            }
            matched
        }
        None => catalog
            .latest_per_role(from, to)
            .into_values()
            .collect(),
    };

    let dest_dir = pair_dir(model_dir, from, to);
    for record in targets {
        let url = format!("{ATTACHMENTS_BASE_URL}/{}", record.attachment.location);
        let opts = FetchOptions {
            sha256: Some(record.attachment.hash.clone()),
            overwrite: false,
        };
        fetch(&dest_dir, &url, &record.attachment.filename, &opts, cancel).await?;
    }

    Ok(())
}

/// Scans the pair directory for files named by the catalog's attachments and
/// assembles a `Fileset`, applying the single-`vocab`-vs-`srcvocab`/`trgvocab`
/// rule.
pub fn get_model_files(
    catalog: &ModelCatalog,
    model_dir: &Path,
    from: &str,
    to: &str,
) -> Result<Fileset, FetchError> {
    let dest_dir = pair_dir(model_dir, from, to);
    let latest = catalog.latest_per_role(from, to);

    let present = |role: FileRole| -> Option<PathBuf> {
        let record = latest.get(&role)?;
        let path = dest_dir.join(&record.attachment.filename);
        path.exists().then_some(path)
    };

    let model = present(FileRole::Model).ok_or_else(|| FetchError::ModelFilesMissing {
        from: from.to_string(),
        to: to.to_string(),
        detail: "model file missing".to_string(),
    })?;
    let lex = present(FileRole::Lex).ok_or_else(|| FetchError::ModelFilesMissing {
        from: from.to_string(),
        to: to.to_string(),
        detail: "lex file missing".to_string(),
    })?;

    let (vocab_src, vocab_trg) = if let Some(vocab) = present(FileRole::Vocab) {
        (vocab.clone(), vocab)
    } else {
        let src = present(FileRole::Srcvocab).ok_or_else(|| FetchError::ModelFilesMissing {
            from: from.to_string(),
            to: to.to_string(),
            detail: "vocab pair incomplete: srcvocab missing".to_string(),
        })?;
        let trg = present(FileRole::Trgvocab).ok_or_else(|| FetchError::ModelFilesMissing {
            from: from.to_string(),
            to: to.to_string(),
            detail: "vocab pair incomplete: trgvocab missing".to_string(),
        })?;
        (src, trg)
    };

    Ok(Fileset {
        model,
        lex,
        vocab_src,
        vocab_trg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtran_catalog::{Attachment, FileRole as Role, ModelRecord};

    fn record(from: &str, to: &str, role: Role, filename: &str, version: &str) -> ModelRecord {
        ModelRecord {
            hash: None,
            name: format!("{from}-{to}-{}", role.as_str()),
            schema: 1,
            to_lang: to.to_string(),
            version: version.to_string(),
            file_type: role,
            from_lang: from.to_string(),
            attachment: Attachment {
                hash: "0".repeat(64),
                size: 1,
                filename: filename.to_string(),
                location: format!("{from}_{to}/{filename}"),
                mimetype: "application/octet-stream".to_string(),
            },
            id: format!("{from}-{to}-{version}-{}", role.as_str()),
        }
    }

    fn catalog_with(records: Vec<ModelRecord>) -> ModelCatalog {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let path = tempdir.path().join("records.json");
        let file = mtran_catalog::CatalogFile { data: records };
        std::fs::write(&path, serde_json::to_string(&file).expect("serialize")).expect("seed");
        let catalog = ModelCatalog::init(tempdir.path()).expect("init");
        std::mem::forget(tempdir);
        catalog
    }

    #[test]
    fn get_model_files_uses_single_vocab_for_both_slots() {
        let catalog = catalog_with(vec![
            record("en", "x", Role::Model, "model.bin", "1.0"),
            record("en", "x", Role::Lex, "lex.bin", "1.0"),
            record("en", "x", Role::Vocab, "vocab.spm", "1.0"),
        ]);
        let model_dir = tempfile::tempdir().expect("model dir");
        let pair_dir = model_dir.path().join("en_x");
        std::fs::create_dir_all(&pair_dir).expect("mkdir");
        for name in ["model.bin", "lex.bin", "vocab.spm"] {
            std::fs::write(pair_dir.join(name), b"x").expect("write");
        }

        let fileset = get_model_files(&catalog, model_dir.path(), "en", "x").expect("fileset");
        assert_eq!(fileset.vocab_src, fileset.vocab_trg);
    }

    #[test]
    fn get_model_files_uses_split_vocab_when_present() {
        let catalog = catalog_with(vec![
            record("en", "x", Role::Model, "model.bin", "1.0"),
            record("en", "x", Role::Lex, "lex.bin", "1.0"),
            record("en", "x", Role::Srcvocab, "src.spm", "1.0"),
            record("en", "x", Role::Trgvocab, "trg.spm", "1.0"),
        ]);
        let model_dir = tempfile::tempdir().expect("model dir");
        let pair_dir = model_dir.path().join("en_x");
        std::fs::create_dir_all(&pair_dir).expect("mkdir");
        for name in ["model.bin", "lex.bin", "src.spm", "trg.spm"] {
            std::fs::write(pair_dir.join(name), b"x").expect("write");
        }

        let fileset = get_model_files(&catalog, model_dir.path(), "en", "x").expect("fileset");
        assert_ne!(fileset.vocab_src, fileset.vocab_trg);
    }

    #[test]
    fn get_model_files_fails_when_model_file_missing() {
        let catalog = catalog_with(vec![record("en", "x", Role::Lex, "lex.bin", "1.0")]);
        let model_dir = tempfile::tempdir().expect("model dir");
        let err = get_model_files(&catalog, model_dir.path(), "en", "x").unwrap_err();
        assert!(matches!(err, FetchError::ModelFilesMissing { .. }));
    }
}
