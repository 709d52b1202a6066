use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{self, EnvFilter};
use weather_audit::common::config::Config;
use weather_audit::dashboard::{self, AppState};

/// Weather audit dashboard - fetches weather from several providers and audits every response
/// Run with: cargo run
/// Configure through the environment or a `.env` file (see `Config`)
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the tracing subscriber with stderr logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!(
        backend = %config.backend_url,
        mock_attack = %config.mock_attack,
        "Starting weather audit dashboard"
    );

    let state = AppState::from_config(&config).context("failed to initialize providers")?;
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {:?}", e);
        }
        tracing::info!("Shutdown requested");
        signal.cancel();
    });

    dashboard::serve(listener, state, shutdown)
        .await
        .inspect_err(|e| {
            tracing::error!("serving error: {:?}", e);
        })?;

    tracing::info!("Weather audit dashboard stopped");
    Ok(())
}
