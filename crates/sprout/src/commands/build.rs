//! Build command.

use std::path::{Path, PathBuf};

use anyhow::Result;
use sprout_static::StaticBuilder;

use super::config::load_build_config;

/// Run the build command.
pub async fn run(
    config_path: &Path,
    output: Option<PathBuf>,
    mode: Option<String>,
    minify: Option<bool>,
) -> Result<()> {
    tracing::info!("Building application...");

    let mut config = load_build_config(config_path)?;
    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(minify) = minify {
        config.minify = minify;
    }
    config.env = config.env.with_overrides(mode, None)?;

    tracing::info!("Mode: {}, name: {:?}", config.env.mode, config.env.name);

    let result = StaticBuilder::new(config).build().await?;

    tracing::info!(
        "Built {} pages, {} modules and {} resources in {}ms",
        result.pages,
        result.modules,
        result.resources,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}
