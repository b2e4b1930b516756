use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use mtran_core::proxy_for_scheme;

use crate::cancel::CancelSignal;
use crate::errors::FetchError;

const MAX_REDIRECTS: usize = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Options for a single `fetch` call.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub sha256: Option<String>,
    pub overwrite: bool,
}

fn build_client(url: &str) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

    if let Some(proxy_url) = proxy_for_scheme(url.starts_with("https")) {
        let proxy = reqwest::Proxy::all(&proxy_url).map_err(|err| FetchError::Network(err.to_string()))?;
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|err| FetchError::Network(err.to_string()))
}

/// Downloads `url` into `{dest_dir}/{filename}`, verifying `sha256` if given.
///
/// Skips the download entirely when the destination already exists, matches
/// the expected hash, and `overwrite` is false.
pub async fn fetch(
    dest_dir: &Path,
    url: &str,
    filename: &str,
    opts: &FetchOptions,
    cancel: Option<&CancelSignal>,
) -> Result<PathBuf, FetchError> {
    tokio::fs::create_dir_all(dest_dir).await?;
    let dest = dest_dir.join(filename);

    if !opts.overwrite && dest.exists() {
        if let Some(expected) = &opts.sha256 {
            if mtran_core::verify_sha256_file(&dest, expected).is_ok() {
                tracing::debug!(filename, "already present and verified, skipping download");
                return Ok(dest);
            }
        }
    }

    tracing::info!(filename, url, "downloading");

    let mut tmp_name = dest.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let client = build_client(url)?;
    let response = client.get(url).send().await?;
    let response = response
        .error_for_status()
        .map_err(|err| FetchError::Network(err.to_string()))?;

    let mut out = tokio::fs::File::create(&tmp_path).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        if cancel.is_some_and(CancelSignal::is_cancelled) {
            drop(out);
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(FetchError::Cancelled);
        }
        let chunk = chunk?;
        out.write_all(&chunk).await?;
    }
    out.flush().await?;
    drop(out);

    if let Some(expected) = &opts.sha256 {
        let actual = mtran_core::sha256_file(&tmp_path).unwrap_or_default();
        if !actual.eq_ignore_ascii_case(expected) {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            tracing::warn!(filename, expected, actual, "downloaded file failed integrity check");
            return Err(FetchError::IntegrityMismatch {
                filename: filename.to_string(),
                expected: expected.clone(),
                actual,
            });
        }
    }

    tokio::fs::rename(&tmp_path, &dest).await?;
    tracing::debug!(filename, "download complete");
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_download_when_existing_file_matches_hash() {
        let tempdir = tempfile::tempdir().expect("tempdir");
        let existing = tempdir.path().join("present.bin");
        std::fs::write(&existing, b"hello").expect("seed");
        let hash = mtran_core::sha256_bytes(b"hello");

        let opts = FetchOptions {
            sha256: Some(hash),
            overwrite: false,
        };
        let result = fetch(tempdir.path(), "http://unused.invalid/present.bin", "present.bin", &opts, None).await;
        assert!(result.is_ok());
    }

    #[test]
    fn cancel_signal_is_observed_via_closure() {
        let cancel = CancelSignal::new();
        cancel.cancel();
        assert!(cancel.is_cancelled());
    }
}
