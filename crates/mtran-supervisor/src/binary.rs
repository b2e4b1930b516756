use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tokio::sync::Mutex;

use crate::errors::SupervisorError;

/// Embedded payload for the worker executable. The real `mtrancore` binary is
/// a pre-built Firefox Translations worker distributed out-of-band; this repo
/// only ships the materialization/supervision logic around it.
const WORKER_BINARY: &[u8] = include_bytes!("../../../assets/worker/mtrancore.stub");
const WORKER_BINARY_HASH: &str =
    "6424519abbdcacec56a5a2a910a8a21562c9b51eca6c34aed5313b8139f86058";

fn worker_binary_name() -> &'static str {
    if cfg!(windows) {
        "mtrancore.exe"
    } else {
        "mtrancore"
    }
}

fn materialization_guard() -> &'static Mutex<bool> {
    static GUARD: OnceLock<Mutex<bool>> = OnceLock::new();
    GUARD.get_or_init(|| Mutex::new(false))
}

/// Writes the embedded worker binary to `{config_dir}/bin/{name}` if it is
/// absent or its content hash doesn't match the expected one. Safe to call
/// repeatedly; only the first caller per process actually touches disk.
pub async fn ensure_worker_binary(config_dir: &Path) -> Result<PathBuf, SupervisorError> {
    let mut initialized = materialization_guard().lock().await;
    let bin_dir = config_dir.join("bin");
    let binary_path = bin_dir.join(worker_binary_name());

    if *initialized {
        return Ok(binary_path);
    }

    if mtran_core::verify_sha256_file(&binary_path, WORKER_BINARY_HASH).is_ok() {
        tracing::debug!("worker binary already present and up to date");
        *initialized = true;
        return Ok(binary_path);
    }

    tokio::fs::create_dir_all(&bin_dir)
        .await
        .map_err(|err| SupervisorError::Spawn(err.to_string()))?;

    tracing::info!(path = %binary_path.display(), "extracting worker binary");
    mtran_core::write_bytes_atomic(&binary_path, WORKER_BINARY)
        .map_err(|err| SupervisorError::Spawn(err.to_string()))?;
    set_executable(&binary_path).map_err(|err| SupervisorError::Spawn(err.to_string()))?;

    *initialized = true;
    Ok(binary_path)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
