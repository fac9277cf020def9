//! HTTP API gateway for hubpilot.
//!
//! Exposes a health check plus the v1 API: the tool catalog and the
//! chat endpoint that runs one sales-assistant turn per request.
//!
//! Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, http::StatusCode, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use hubpilot_agent::{BuildError, SalesAgent};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<SalesAgent>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl GatewayState {
    pub fn new(agent: SalesAgent) -> Self {
        Self {
            agent: Arc::new(agent),
            started_at: chrono::Utc::now(),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Build the Axum router with every gateway route.
///
/// Request bodies are capped at 1 MB.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: hubpilot_config::AppConfig) -> Result<(), GatewayError> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let agent = hubpilot_agent::build_from_config(&config)?;
    let app = build_router(Arc::new(GatewayState::new(agent)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| GatewayError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(address = %addr, "Gateway listening");

    axum::serve(listener, app).await.map_err(GatewayError::Serve)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
}

async fn health_handler(
    axum::extract::State(state): axum::extract::State<SharedState>,
) -> (StatusCode, Json<HealthResponse>) {
    let uptime = chrono::Utc::now() - state.started_at;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            uptime_secs: uptime.num_seconds(),
        }),
    )
}
