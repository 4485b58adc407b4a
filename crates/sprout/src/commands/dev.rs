//! Development server command.

use std::path::Path;

use anyhow::Result;
use sprout_server::{DevServer, DevServerConfig};

use super::config::load_build_config;

/// Run the dev server.
pub async fn run(config_path: &Path, port: u16, open: bool) -> Result<()> {
    tracing::info!("Starting development server on port {}", port);

    let mut build = load_build_config(config_path)?;
    build.minify = false;

    let config = DevServerConfig {
        build,
        port,
        open,
        ..Default::default()
    };

    DevServer::new(config).start().await?;

    Ok(())
}
