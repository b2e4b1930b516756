use std::sync::Arc;

use mtran_channel::ChannelClient;
use mtran_supervisor::Worker;

/// A snapshot of one engine's live process + connection, safe to clone and
/// hold across an `await` without touching the cache's lock.
#[derive(Clone)]
pub struct EngineHandle {
    pub key: String,
    pub supervisor: Arc<Worker>,
    pub client: Arc<ChannelClient>,
}
