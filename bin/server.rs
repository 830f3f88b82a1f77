// BIN Checker - Web Server
// Upload page + JSON/CSV API with Axum

use anyhow::{Context, Result};
use bin_checker::{api, logging, ServerConfig};
use tracing::info;

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    logging::init("bin_checker=info,tower_http=debug");

    let config = ServerConfig::from_env().context("Failed to load server configuration")?;

    info!("Starting BIN Checker server v{}", bin_checker::VERSION);
    info!(max_upload_bytes = config.max_upload_bytes, "Upload limit");

    let app = api::router(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_target())
        .await
        .with_context(|| format!("Failed to bind to {}:{}", config.host, config.port))?;
    let addr = listener.local_addr()?;

    info!("Listening on http://{}", addr);
    info!("   UI:  http://{}/", addr);
    info!("   API: http://{}/api/check", addr);

    axum::serve(listener, app)
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}
