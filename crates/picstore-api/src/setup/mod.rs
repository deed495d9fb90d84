//! Application setup

pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use picstore_core::Config;
use picstore_storage::create_storage;
use std::sync::Arc;

use crate::state::AppState;

/// Initialize the application: tracing, storage and the router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Invalid configuration")?;

    crate::telemetry::init_telemetry(config.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        storage_backend = ?config.storage_backend,
        "Starting picstore"
    );

    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage")?;

    build_app(config, storage)
}

/// Wire state and routes around an already constructed storage backend.
pub fn build_app(
    config: Config,
    storage: Arc<dyn picstore_storage::Storage>,
) -> Result<(Arc<AppState>, axum::Router)> {
    let state = Arc::new(AppState::new(&config, storage));
    let router = routes::setup_routes(&config, state.clone())?;

    tracing::info!(
        backend = ?state.storage.backend_type(),
        max_upload_size_bytes = config.max_upload_size_bytes,
        "Application initialized"
    );

    Ok((state, router))
}
