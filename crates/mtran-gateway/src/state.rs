use std::sync::Arc;

use tokio::sync::RwLock;

use mtran_catalog::ModelCatalog;
use mtran_engine::EngineCache;
use mtran_planner::TranslationPlanner;

use crate::config::GatewayConfig;

/// Shared application state handed to every axum handler via `State`.
pub struct AppState {
    pub config: GatewayConfig,
    pub catalog: Arc<RwLock<ModelCatalog>>,
    pub planner: TranslationPlanner,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        catalog: Arc<RwLock<ModelCatalog>>,
        engine_cache: Arc<EngineCache>,
    ) -> Self {
        let planner = TranslationPlanner::new(engine_cache, Arc::clone(&catalog));
        Self {
            config,
            catalog,
            planner,
        }
    }
}
