//! Preview server command.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sprout_server::spa_router;

use super::config::load_build_config;

/// Directory to preview: `dir` when given, else the configured output.
pub fn serve_dir(config_path: &Path, dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => Ok(load_build_config(config_path)?.output_path()),
    }
}

/// Run the serve command.
pub async fn run(config_path: &Path, port: u16, dir: Option<PathBuf>) -> Result<()> {
    let dir = serve_dir(config_path, dir)?;
    if !dir.exists() {
        anyhow::bail!(
            "Directory not found: {}. Run 'sprout build' first.",
            dir.display()
        );
    }

    let addr: SocketAddr = format!("127.0.0.1:{}", port)
        .parse()
        .context("Invalid address")?;

    tracing::info!("Serving {} at http://{}", dir.display(), addr);

    let app = spa_router(&dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Open browser
    let url = format!("http://{}", addr);
    let _ = open::that(&url);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn defaults_to_configured_output() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("sprout.toml");
        fs::write(&config, "[project]\noutput = \"public\"\n").unwrap();

        let dir = serve_dir(&config, None).unwrap();

        assert_eq!(dir, temp.path().join("public"));
    }

    #[test]
    fn explicit_dir_wins() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("sprout.toml");
        fs::write(&config, "[project]\noutput = \"public\"\n").unwrap();

        let dir = serve_dir(&config, Some(PathBuf::from("elsewhere"))).unwrap();

        assert_eq!(dir, PathBuf::from("elsewhere"));
    }
}
