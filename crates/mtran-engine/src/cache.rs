use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::Instant;

use mtran_catalog::ModelCatalog;
use mtran_channel::{ChannelClient, PoweronRequest};
use mtran_supervisor::{Worker, WorkerArgs};

use crate::errors::EngineError;
use crate::handle::EngineHandle;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);
const READY_POLL_ATTEMPTS: u32 = 30;
const STABLE_RUNNING_SETTLE: Duration = Duration::from_millis(500);
const CONNECT_RETRY_ATTEMPTS: u32 = 1;
const RECOVERY_CONNECT_ATTEMPTS: u32 = 50;
const RECOVERY_CONNECT_INTERVAL: Duration = Duration::from_millis(100);
const CLEANUP_ALL_BUDGET: Duration = Duration::from_secs(15);
const RECOVERY_GRACE_DELAY: Duration = Duration::from_millis(200);

/// Static configuration shared by every engine the cache creates.
#[derive(Debug, Clone)]
pub struct EngineCacheConfig {
    pub model_dir: PathBuf,
    pub config_dir: PathBuf,
    pub host: String,
    pub idle_timeout: Duration,
    pub offline: bool,
    pub log_level: String,
}

struct EngineEntry {
    key: String,
    from: String,
    to: String,
    handle: RwLock<Arc<EngineHandle>>,
    last_used: Mutex<Instant>,
    recovery: Mutex<Option<Arc<Notify>>>,
    idle_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

/// Process-wide `(from, to) -> Engine` map with idle eviction and fault
/// recovery.
pub struct EngineCache {
    config: EngineCacheConfig,
    catalog: Arc<RwLock<ModelCatalog>>,
    entries: RwLock<HashMap<String, Arc<EngineEntry>>>,
}

/// Display key, `"{from}-{to}"`. Language codes may themselves contain
/// hyphens (`zh-Hans`), so this is for logging/lookup only — never split it
/// back into `from`/`to`; `EngineEntry` carries those separately.
fn engine_key(from: &str, to: &str) -> String {
    format!("{from}-{to}")
}

impl EngineCache {
    pub fn new(config: EngineCacheConfig, catalog: Arc<RwLock<ModelCatalog>>) -> Arc<Self> {
        Arc::new(Self {
            config,
            catalog,
            entries: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the live engine for `(from, to)`, creating and poweron-ing it
    /// on first use. Concurrent misses on the same key coalesce: only one
    /// caller spawns a worker, via double-checked locking on `entries`.
    pub async fn get_or_create(
        self: &Arc<Self>,
        from: &str,
        to: &str,
    ) -> Result<Arc<EngineHandle>, EngineError> {
        let key = engine_key(from, to);

        if let Some(entry) = self.entries.read().await.get(&key).cloned() {
            let handle = entry.handle.read().await.clone();
            if handle.supervisor.is_running().await {
                self.touch(&entry).await;
                return Ok(handle);
            }
        }

        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(&key).cloned() {
            let handle = entry.handle.read().await.clone();
            if handle.supervisor.is_running().await {
                drop(entries);
                self.touch(&entry).await;
                return Ok(handle);
            }
        }

        tracing::info!(from, to, "creating new engine");
        let handle = self.spawn_engine(from, to, CONNECT_RETRY_ATTEMPTS).await?;

        let entry = Arc::new(EngineEntry {
            key: key.clone(),
            from: from.to_string(),
            to: to.to_string(),
            handle: RwLock::new(Arc::new(handle)),
            last_used: Mutex::new(Instant::now()),
            recovery: Mutex::new(None),
            idle_task: Mutex::new(None),
        });
        let idle_task = self.spawn_idle_timer(&entry);
        *entry.idle_task.lock().await = Some(idle_task);

        let handle = entry.handle.read().await.clone();
        entries.insert(key, entry);
        Ok(handle)
    }

    /// Spawns a worker for `(from, to)`, loads its model, and waits for it
    /// to report ready. `connect_attempts` lets fault recovery poll-connect
    /// for longer than a fresh creation normally needs.
    async fn spawn_engine(
        &self,
        from: &str,
        to: &str,
        connect_attempts: u32,
    ) -> Result<EngineHandle, EngineError> {
        if self.config.offline {
            tracing::info!("offline mode enabled, skipping model download");
        } else {
            let catalog = self.catalog.read().await;
            mtran_fetcher::download_model(&catalog, &self.config.model_dir, from, to, None, None)
                .await?;
        }

        let catalog = self.catalog.read().await;
        let fileset = mtran_fetcher::get_model_files(&catalog, &self.config.model_dir, from, to)?;
        drop(catalog);

        let port = mtran_core::allocate_free_port()
            .map_err(|err| EngineError::PortAllocation(err.to_string()))?;
        let work_dir = self.config.model_dir.join(format!("{from}_{to}"));
        let binary_path = mtran_supervisor::ensure_worker_binary(&self.config.config_dir).await?;

        let supervisor = Arc::new(Worker::new(WorkerArgs {
            host: self.config.host.clone(),
            port,
            work_dir,
            log_level: self.config.log_level.clone(),
            binary_path,
        }));

        supervisor.start().await?;
        tokio::time::sleep(STABLE_RUNNING_SETTLE).await;
        if !supervisor.is_running().await {
            let _ = supervisor.cleanup().await;
            return Err(EngineError::NotReady);
        }

        let client = Arc::new(ChannelClient::new(format!(
            "ws://{}:{}/ws",
            self.config.host, port
        )));
        if let Err(err) = connect_with_retry(&client, connect_attempts).await {
            let _ = supervisor.cleanup().await;
            return Err(err.into());
        }

        let poweron_req = PoweronRequest {
            model_path: file_name_of(&fileset.model),
            lexical_shortlist_path: file_name_of(&fileset.lex),
            vocabulary_paths: vec![file_name_of(&fileset.vocab_src), file_name_of(&fileset.vocab_trg)],
        };
        if let Err(err) = client.poweron(poweron_req).await {
            let _ = supervisor.cleanup().await;
            return Err(err.into());
        }

        let mut ready = false;
        for _ in 0..READY_POLL_ATTEMPTS {
            if matches!(client.ready().await, Ok(true)) {
                ready = true;
                break;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        if !ready {
            let _ = supervisor.cleanup().await;
            return Err(EngineError::NotReady);
        }

        tracing::info!(from, to, port, "engine created successfully");
        Ok(EngineHandle {
            key: engine_key(from, to),
            supervisor,
            client,
        })
    }

    async fn touch(&self, entry: &Arc<EngineEntry>) {
        *entry.last_used.lock().await = Instant::now();
    }

    fn spawn_idle_timer(self: &Arc<Self>, entry: &Arc<EngineEntry>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        let key = entry.key.clone();
        let idle_timeout = self.config.idle_timeout;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(idle_timeout).await;
                let entries = cache.entries.read().await;
                let Some(entry) = entries.get(&key).cloned() else {
                    return;
                };
                drop(entries);
                let elapsed = entry.last_used.lock().await.elapsed();
                if elapsed >= idle_timeout {
                    drop(entry);
                    tracing::info!(key, "engine idle timeout, evicting");
                    cache.evict(&key).await;
                    return;
                }
            }
        })
    }

    /// Stops the idle timer, tears the engine down, and removes it from the map.
    pub async fn evict(&self, key: &str) {
        let removed = self.entries.write().await.remove(key);
        let Some(entry) = removed else { return };
        teardown_entry(&entry, "failed to cleanup engine supervisor").await;
    }

    /// Evicts every engine concurrently, bounded by a 15s overall budget.
    pub async fn cleanup_all(&self) {
        let entries: Vec<Arc<EngineEntry>> = {
            let mut map = self.entries.write().await;
            map.drain().map(|(_, entry)| entry).collect()
        };
        if entries.is_empty() {
            return;
        }
        tracing::info!(count = entries.len(), "cleaning up all engines");

        let teardown_futures = entries
            .iter()
            .map(|entry| teardown_entry(entry, "cleanup failed during shutdown"));

        if tokio::time::timeout(CLEANUP_ALL_BUDGET, join_all(teardown_futures))
            .await
            .is_err()
        {
            tracing::warn!("engine cleanup timeout after 15 seconds");
        }
    }

    /// Fault recovery: swap the failing engine for a freshly spawned one on
    /// a new port, returning the new handle for the planner's retry. A
    /// concurrent caller arriving mid-recovery awaits the same completion
    /// signal instead of racing its own reconnect.
    pub async fn recover(self: &Arc<Self>, key: &str) -> Result<Arc<EngineHandle>, EngineError> {
        let entry = self
            .entries
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or(EngineError::NotReady)?;

        let notify = {
            let mut slot = entry.recovery.lock().await;
            if let Some(existing) = slot.clone() {
                drop(slot);
                existing.notified().await;
                return Ok(entry.handle.read().await.clone());
            }
            let notify = Arc::new(Notify::new());
            *slot = Some(Arc::clone(&notify));
            notify
        };

        let old_handle = entry.handle.read().await.clone();

        let spawn_result = self
            .spawn_engine(&entry.from, &entry.to, RECOVERY_CONNECT_ATTEMPTS)
            .await;

        let result = match spawn_result {
            Ok(handle) => {
                let handle = Arc::new(handle);
                *entry.handle.write().await = Arc::clone(&handle);
                self.touch(&entry).await;

                let old_supervisor = Arc::clone(&old_handle.supervisor);
                let old_client = Arc::clone(&old_handle.client);
                tokio::spawn(async move {
                    tokio::time::sleep(RECOVERY_GRACE_DELAY).await;
                    old_client.close().await;
                    let _ = old_supervisor.cleanup().await;
                });
                Ok(handle)
            }
            Err(err) => Err(err),
        };

        *entry.recovery.lock().await = None;
        notify.notify_waiters();
        result
    }
}

async fn teardown_entry(entry: &Arc<EngineEntry>, cleanup_failure_msg: &str) {
    if let Some(task) = entry.idle_task.lock().await.take() {
        task.abort();
    }
    let handle = entry.handle.read().await.clone();
    if let Err(err) = handle.supervisor.cleanup().await {
        tracing::warn!(key = %entry.key, %err, "{}", cleanup_failure_msg);
    }
    handle.client.close().await;
}

async fn connect_with_retry(
    client: &ChannelClient,
    attempts: u32,
) -> Result<(), mtran_channel::ChannelError> {
    let attempts = attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match client.connect().await {
            Ok(()) => return Ok(()),
            Err(err) => {
                last_err = Some(err);
                if attempt + 1 < attempts {
                    tokio::time::sleep(RECOVERY_CONNECT_INTERVAL).await;
                }
            }
        }
    }
    Err(last_err.expect("at least one attempt always runs"))
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_key_joins_with_a_dash() {
        assert_eq!(engine_key("en", "zh-Hans"), "en-zh-Hans");
    }

    #[test]
    fn engine_key_matches_the_documented_pivot_keys() {
        assert_eq!(engine_key("zh-Hans", "en"), "zh-Hans-en");
        assert_eq!(engine_key("en", "ja"), "en-ja");
    }

    #[test]
    fn file_name_of_strips_directory_components() {
        let path = std::path::Path::new("/models/en_ja/model.bin");
        assert_eq!(file_name_of(path), "model.bin");
    }
}
