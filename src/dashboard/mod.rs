//! Dashboard HTTP API.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /health` | Liveness |
//! | `GET /api/weather?city=&api=` | Search, audited |
//! | `GET /api/compare?city=` | All providers side by side, not audited |
//! | `GET /api/audit?limit=` | Latest audit entries, newest first |
//! | `GET /api/audit/stats` | Summary counts |
//! | `GET /api/dashboard` | Display state, latest entries and stats |
//! | `GET /api/mock/malicious?attack=` | Adversarial provider endpoint |
//!
//! Malformed query strings and unknown routes answer with the same JSON
//! `{error, status}` body as validation failures.

pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::common::config::Config;
use crate::common::provider_registry::ProviderRegistry;
use crate::common::security::AuditRecorder;
use crate::mock::MockService;
use crate::weather::{FetchError, WeatherIngestion};

pub use error::{AppError, AppResult};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ingestion: Arc<WeatherIngestion>,
    pub mock: Arc<MockService>,
}

impl AppState {
    pub fn new(ingestion: Arc<WeatherIngestion>, mock: Arc<MockService>) -> Self {
        Self { ingestion, mock }
    }

    /// Wire providers, audit trail and mock service from configuration
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let mock = Arc::new(MockService::new(config.mock_rate_limit, config.mock_rate_window));
        let registry = ProviderRegistry::new(config, mock.clone())?;
        let audit = Arc::new(AuditRecorder::new(config.audit_capacity));
        let ingestion = Arc::new(WeatherIngestion::new(registry, audit, config.fetch_timeout));
        Ok(Self::new(ingestion, mock))
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/weather", get(handlers::weather))
        .route("/api/compare", get(handlers::compare))
        .route("/api/audit", get(handlers::audit_log))
        .route("/api/audit/stats", get(handlers::audit_stats))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/mock/malicious", get(handlers::mock_malicious))
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Serve the dashboard on `listener` until `shutdown` is cancelled
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Dashboard listening on http://{}", addr);
    }

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
