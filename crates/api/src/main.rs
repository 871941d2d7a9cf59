//! NeuroPlay Prediction Server - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ServerConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("failed to load configuration")?;
    init_logging(&config.log_level, config.log_json)?;

    info!("=== NeuroPlay Server v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Drawing model: {} ({:?}), voice model: {} ({:?})",
        config.drawing_model.path.display(),
        config.drawing_model.kind,
        config.voice_model.path.display(),
        config.voice_model.kind
    );

    run_server(config).await
}
