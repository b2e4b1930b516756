mod config;
mod errors;
mod http;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use mtran_catalog::ModelCatalog;
use mtran_engine::{EngineCache, EngineCacheConfig};

use crate::config::{CliArgs, GatewayConfig};
use crate::state::AppState;

fn init_tracing(log_level: &str) {
    let default_level = match log_level {
        "debug" => LevelFilter::DEBUG,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = GatewayConfig::from_args(args);
    init_tracing(&config.log_level);

    std::fs::create_dir_all(&config.config_dir)
        .with_context(|| format!("failed to create {}", config.config_dir.display()))?;
    std::fs::create_dir_all(&config.model_dir)
        .with_context(|| format!("failed to create {}", config.model_dir.display()))?;

    let catalog = ModelCatalog::init(&config.config_dir).context("failed to load model catalog")?;
    let catalog = Arc::new(RwLock::new(catalog));

    let engine_cache = EngineCache::new(
        EngineCacheConfig {
            model_dir: config.model_dir.clone(),
            config_dir: config.config_dir.clone(),
            host: config.host.clone(),
            idle_timeout: config.worker_idle_timeout,
            offline: config.offline,
            log_level: config.log_level.clone(),
        },
        Arc::clone(&catalog),
    );

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "mtran gateway listening");

    let state = Arc::new(AppState::new(config, catalog, Arc::clone(&engine_cache)));
    let app = http::build_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("gateway server exited unexpectedly")?;

    tracing::info!("shutting down, cleaning up engines");
    engine_cache.cleanup_all().await;

    Ok(())
}
