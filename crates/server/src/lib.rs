//! # rf-server
//!
//! HTTP surface for reelforge.
//!
//! Routes:
//! - `POST /api/v1/generate`: start a pipeline, progress as Server-Sent Events
//! - `GET /api/v1/videos/:video_id`: download a published video
//! - `GET /api/v1/runs`, `GET /api/v1/runs/:run_id`: run snapshots
//! - `DELETE /api/v1/runs/:run_id`: cancel a run
//! - `GET /`, `GET /health`: liveness

pub mod api;
pub mod error;
pub mod sweeper;

pub use error::{ApiError, ServerError};

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use rf_core::capabilities::CapabilitySet;
use rf_core::engine::PipelineEngine;
use rf_core::state::RunManager;
use rf_core::storage::{ArtifactStore, StorageArea};
use rf_protocol::{ServerConfig, ServiceConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub runs: Arc<RunManager>,
    pub artifacts: ArtifactStore,
    pub server: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(runs: Arc<RunManager>, artifacts: ArtifactStore, server: ServerConfig) -> Self {
        Self {
            runs,
            artifacts,
            server: Arc::new(server),
        }
    }

    /// Wire the engine, run manager and artifact store from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Storage` if the output directory cannot be created.
    pub fn from_config(
        config: &ServiceConfig,
        capabilities: CapabilitySet,
    ) -> Result<Self, ServerError> {
        let artifacts = ArtifactStore::open(&config.storage.output_dir)?;
        let storage = StorageArea::new(config.storage.work_root.clone(), artifacts.clone());
        let engine = Arc::new(PipelineEngine::new(capabilities, storage));
        let runs = Arc::new(RunManager::new(engine, config.pipeline.event_buffer));
        Ok(Self::new(runs, artifacts, config.server.clone()))
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .expose_headers([axum::http::HeaderName::from_static("x-run-id")])
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.server.max_upload_bytes;
    let cors = cors_layer(&state.server.cors_origins);

    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health))
        .route("/api/v1/generate", post(api::generate::generate_video))
        .route("/api/v1/videos/:video_id", get(api::videos::get_video))
        .route("/api/v1/runs", get(api::runs::list_runs))
        .route(
            "/api/v1/runs/:run_id",
            get(api::runs::get_run).delete(api::runs::cancel_run),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Run the HTTP server until Ctrl-C.
///
/// On shutdown every in-flight run is cancelled, which closes their event
/// streams so open connections can drain.
///
/// # Errors
///
/// Returns `ServerError` if the output directory cannot be prepared, the
/// address cannot be bound, or serving fails.
pub async fn serve(config: ServiceConfig, capabilities: CapabilitySet) -> Result<(), ServerError> {
    let state = AppState::from_config(&config, capabilities)?;
    let runs = Arc::clone(&state.runs);
    let stop = CancellationToken::new();

    let artifact_ttl = config.storage.artifact_ttl_secs.map(Duration::from_secs);
    if let Some(ttl) = artifact_ttl {
        info!(ttl_secs = ttl.as_secs(), "Artifact expiry enabled");
    }
    let sweep_task = sweeper::spawn_sweeper(
        state.artifacts.clone(),
        artifact_ttl,
        Arc::clone(&runs),
        Duration::from_secs(config.pipeline.run_retention_secs),
        Duration::from_secs(config.storage.sweep_interval_secs),
        stop.clone(),
    );

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(addr = %addr, "Starting HTTP server");

    let shutdown = {
        let runs = Arc::clone(&runs);
        async move {
            shutdown_signal().await;
            info!("Shutdown requested; cancelling runs");
            runs.shutdown().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    stop.cancel();
    if let Err(e) = sweep_task.await {
        warn!(error = %e, "Sweeper task failed");
    }
    info!("Server stopped");
    Ok(())
}
