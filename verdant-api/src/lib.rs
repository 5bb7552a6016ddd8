//! verdant-api library interface
//!
//! Exposes the router and its collaborators for the binary and for
//! integration testing.

pub mod api;
pub mod blob;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::blob::BlobStore;
use crate::services::{GardenEntryWriter, InferenceService, SpeciesCoordinator};
use crate::store::PlantStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlantStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub inference: Arc<dyn InferenceService>,
    /// Owner of saves and gardens when the client sends no `user_id`
    pub default_user_id: String,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PlantStore>,
        blobs: Arc<dyn BlobStore>,
        inference: Arc<dyn InferenceService>,
        default_user_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            blobs,
            inference,
            default_user_id: default_user_id.into(),
            startup_time: Utc::now(),
        }
    }

    pub fn coordinator(&self) -> SpeciesCoordinator {
        SpeciesCoordinator::new(self.store.clone())
    }

    pub fn writer(&self) -> GardenEntryWriter {
        GardenEntryWriter::new(self.store.clone(), self.blobs.clone())
    }
}

/// Router settings that do not belong in handler state
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Directory served at `/media` (filesystem blob backend only)
    pub media_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            media_dir: None,
            max_upload_bytes: 10 * 1024 * 1024,
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// Build application router with default options
pub fn build_router(state: AppState) -> Router {
    build_router_with(state, RouterOptions::default())
}

/// Build application router
pub fn build_router_with(state: AppState, options: RouterOptions) -> Router {
    let mut router = Router::new()
        .merge(api::health_routes())
        .merge(api::plant_routes())
        .merge(api::garden_routes());

    if let Some(dir) = options.media_dir {
        router = router.nest_service("/media", ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
