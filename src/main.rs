use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use testing_guide::{
    config::AppConfig,
    gemini::GeminiClient,
    routes::{router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env().context("loading configuration")?;
    if config.generation.credential.is_some() {
        tracing::info!(api_key = config.credential_status(), "Gemini credential loaded");
    } else {
        tracing::warn!("GOOGLE_API_KEY is not set; generation requests will fail authentication");
    }
    tracing::info!(
        model = %config.generation.model_id,
        max_retries = config.generation.max_retries,
        timeout = ?config.generation.timeout,
        "Generation client configured"
    );

    let gemini = GeminiClient::new(&config.generation).context("building Gemini client")?;
    let state = AppState {
        generator: Arc::new(gemini),
        max_upload_bytes: config.max_upload_bytes,
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "Starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
