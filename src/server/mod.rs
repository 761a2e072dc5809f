//! HTTP surface of the emulator.
//!
//! Endpoints:
//!   POST   /v2/pipeline, /v3/pipeline                   → pipeline, database from `Host`
//!   POST   /db/:database/v2/pipeline, .../v3/pipeline   → pipeline, database from the path
//!   GET    /v2, /v3, /db/:database/v2, /db/:database/v3 → protocol version probes
//!   GET    /health                                      → liveness probe
//!   POST   /v1/organizations/:org/databases             → create database
//!   GET    /v1/organizations/:org/databases             → list databases
//!   GET    /v1/organizations/:org/databases/:database   → database info
//!   DELETE /v1/organizations/:org/databases/:database   → delete database

pub mod host;
mod management;
mod pipeline;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::SqlEmulatorError;
use crate::registry::DatabaseRegistry;

pub use host::{DEFAULT_DATABASE, database_from_host};

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<DatabaseRegistry>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Open the registry under `config.db_dir`.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::Io` if the database directory cannot be created.
    pub fn new(config: ServerConfig) -> Result<Self, SqlEmulatorError> {
        let registry = DatabaseRegistry::new(&config.db_dir)?;
        Ok(Self {
            registry: Arc::new(registry),
            config: Arc::new(config),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(pipeline::health))
        .route("/v2", get(pipeline::version_probe))
        .route("/v3", get(pipeline::version_probe))
        .route("/v2/pipeline", post(pipeline::host_pipeline))
        .route("/v3/pipeline", post(pipeline::host_pipeline))
        .route("/db/:database/v2", get(pipeline::version_probe))
        .route("/db/:database/v3", get(pipeline::version_probe))
        .route("/db/:database/v2/pipeline", post(pipeline::path_pipeline))
        .route("/db/:database/v3/pipeline", post(pipeline::path_pipeline))
        .route(
            "/v1/organizations/:org/databases",
            post(management::create_database).get(management::list_databases),
        )
        .route(
            "/v1/organizations/:org/databases/:database",
            get(management::get_database).delete(management::delete_database),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `config.listen` and serve until the process stops.
///
/// # Errors
/// Returns `SqlEmulatorError::ConfigError` for unusable settings, otherwise
/// `SqlEmulatorError::Io` if the database directory cannot be created, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: ServerConfig) -> Result<(), SqlEmulatorError> {
    config.validate()?;
    let addr = config.listen;
    let state = AppState::new(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, root = %state.registry.root().display(), "sql emulator listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
