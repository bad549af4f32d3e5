mod api;
mod middleware;

use std::sync::Arc;

use anyhow::Context;
use newsbrief_core::AppConfig;
use newsbrief_pipeline::{PipelineConfig, PipelineOrchestrator, ProviderMode, Providers};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState};

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = newsbrief_core::load_app_config()?;
    init_tracing(&config)?;
    tracing::debug!(?config, "configuration loaded");

    // ServeDir answers 404 for a missing root; create it so /audio works
    // before the first synthesis.
    tokio::fs::create_dir_all(&config.audio_dir)
        .await
        .with_context(|| format!("creating audio dir {}", config.audio_dir.display()))?;

    let providers = Providers::from_app_config(&config, ProviderMode::Online)?;
    let orchestrator = PipelineOrchestrator::new(providers, PipelineConfig::from_app_config(&config));
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
    };
    let app = build_app(state, &config.audio_dir, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "newsbrief-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("newsbrief-server stopped");
    Ok(())
}

/// Resolves on ctrl-c, or SIGTERM on unix.
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!("ctrl-c received, draining connections"),
        () = terminate => tracing::info!("SIGTERM received, draining connections"),
    }
}
