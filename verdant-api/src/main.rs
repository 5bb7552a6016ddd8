//! verdant-api - Plant diagnosis service
//!
//! Accepts plant photos from the mobile client, asks a multimodal model for
//! a species and health diagnosis, and records plants in user gardens.
//!
//! Storage, photo and inference backends are chosen by configuration; see
//! `verdant_common::config::TomlConfig`.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use verdant_common::config::{
    load_toml_config_or_default, BlobBackend, ConfigSource, InferenceBackend,
    RootFolderInitializer, RootFolderResolver, StorageBackend,
};

use verdant_api::blob::{BlobStore, FsBlobStore, MemoryBlobStore};
use verdant_api::config::{resolve_inference_api_key, Cli, ServiceConfig};
use verdant_api::services::{GeminiClient, InferenceService, MockInference};
use verdant_api::store::{MemoryPlantStore, PlantStore, SqlitePlantStore};
use verdant_api::{build_router_with, AppState, RouterOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (toml_config, config_source) = load_toml_config_or_default(cli.config.as_deref());
    let config = ServiceConfig::resolve(&cli, &toml_config);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting Verdant API (verdant-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_source {
        ConfigSource::File(path) => info!("Config file: {}", path.display()),
        ConfigSource::Missing(Some(path)) => {
            info!("No config file at {}, using defaults", path.display())
        }
        ConfigSource::Missing(None) => info!("No config directory, using defaults"),
        ConfigSource::Invalid { path, error } => {
            warn!("Ignoring config file {}: {}", path.display(), error)
        }
    }

    let resolver = RootFolderResolver::new("verdant-api")
        .with_cli_arg(cli.root_folder.clone())
        .with_toml_root(toml_config.root_folder.clone());
    let initializer = RootFolderInitializer::new(resolver.resolve());
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;

    let store: Arc<dyn PlantStore> = match config.storage_backend {
        StorageBackend::Sqlite => {
            let db_path = initializer.database_path();
            info!("Database: {}", db_path.display());
            let pool = verdant_common::db::init_database(&db_path)
                .await
                .context("Failed to open database")?;
            Arc::new(SqlitePlantStore::new(pool))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory plant store; data is lost on restart");
            Arc::new(MemoryPlantStore::new())
        }
    };

    let mut media_dir = None;
    let blobs: Arc<dyn BlobStore> = match config.blob_backend {
        BlobBackend::Filesystem => {
            let blob_path = initializer.blob_path();
            info!("Photo store: {}", blob_path.display());
            media_dir = Some(blob_path.clone());
            let base_url = config
                .public_base_url
                .clone()
                .unwrap_or_else(|| "/media".to_string());
            Arc::new(FsBlobStore::new(blob_path, base_url))
        }
        BlobBackend::Memory => {
            warn!("Using in-memory photo store; photos are lost on restart");
            match config.public_base_url.clone() {
                Some(base_url) => Arc::new(MemoryBlobStore::new(base_url)),
                None => Arc::new(MemoryBlobStore::default()),
            }
        }
    };

    let inference: Arc<dyn InferenceService> = match config.inference.backend {
        InferenceBackend::Gemini => match resolve_inference_api_key(&toml_config) {
            Some(api_key) => {
                let client = GeminiClient::new(
                    config.inference.base_url.clone(),
                    config.inference.model.clone(),
                    api_key,
                    config.inference.timeout_secs,
                )
                .context("Failed to build inference client")?;
                info!("Inference: Gemini model {}", config.inference.model);
                Arc::new(client)
            }
            None => {
                warn!(
                    "Gemini inference selected but no API key configured \
                     (set VERDANT_INFERENCE_API_KEY or [inference] api_key); using mock diagnoses"
                );
                Arc::new(MockInference::default())
            }
        },
        InferenceBackend::Mock => {
            info!("Inference: mock");
            Arc::new(MockInference::default())
        }
    };

    let state = AppState::new(store, blobs, inference, config.default_user_id.clone());
    let app = build_router_with(
        state,
        RouterOptions {
            media_dir,
            max_upload_bytes: config.max_upload_bytes,
            request_timeout: config.request_timeout,
        },
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;
    info!("Listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
