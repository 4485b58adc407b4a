//! Scaffold a starter project.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Run the init command in the current directory.
pub async fn run(yes: bool) -> Result<()> {
    tracing::info!("Initializing sprout...");

    let written = scaffold(Path::new("."), yes)?;
    if written.is_empty() {
        tracing::warn!("Project files already exist. Use --yes to overwrite.");
        return Ok(());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'sprout dev' to start the development server.");

    Ok(())
}

/// Write the starter files under `root`, returning the paths written.
///
/// Existing files are kept unless `overwrite` is set.
pub fn scaffold(root: &Path, overwrite: bool) -> Result<Vec<PathBuf>> {
    let files: [(&str, &[u8]); 6] = [
        ("sprout.toml", DEFAULT_CONFIG.as_bytes()),
        ("src/index.js", DEFAULT_ENTRY.as_bytes()),
        ("src/index.html", DEFAULT_DOCUMENT.as_bytes()),
        ("src/styles.css", DEFAULT_STYLES.as_bytes()),
        ("src/assets/react-js-icon.svg", ICON_SVG.as_bytes()),
        ("src/assets/react-js-icon.png", ICON_PNG),
    ];

    let mut written = Vec::new();
    for (relative, contents) in files {
        let path = root.join(relative);
        if path.exists() && !overwrite {
            tracing::debug!("Keeping {}", relative);
            continue;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", relative))?;
        tracing::info!("Created {}", relative);
        written.push(path);
    }

    Ok(written)
}

const DEFAULT_CONFIG: &str = r#"# Sprout Configuration

[project]
# Entry script
entry = "src/index.js"

# HTML document template
template = "src/index.html"

# Output directory for the bundle and document
output = "dist"

# Document title
title = "Sprout App"

# URL prefix for emitted files
public_path = "/"

[env]
# development or production (SPROUT_MODE overrides)
mode = "development"

# Shown next to each page heading (SPROUT_NAME overrides)
name = "sprout"

[build]
# Minify injected style sheets
minify = true

# Extra file-type rules, checked before the built-in ones
# [[rules]]
# test = "\\.txt$"
# strategy = "resource"
"#;

const DEFAULT_ENTRY: &str = r#"import './styles.css';
import icon from './assets/react-js-icon.svg';

const favicon = document.createElement('link');
favicon.rel = 'icon';
favicon.href = icon;
document.head.appendChild(favicon);

console.log('sprout', process.env.NODE_ENV, process.env.name);
"#;

const DEFAULT_DOCUMENT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{{ title }}</title>
</head>
<body>
  <div id="root">{{ app | safe }}</div>
</body>
</html>
"#;

const DEFAULT_STYLES: &str = r#"body {
  margin: 0;
  font-family: system-ui, sans-serif;
}

h1 {
  font-weight: 500;
}
"#;

const ICON_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-11.5 -10.232 23 20.463">
  <circle r="2.05" fill="#61dafb"/>
  <g stroke="#61dafb" fill="none">
    <ellipse rx="11" ry="4.2"/>
    <ellipse rx="11" ry="4.2" transform="rotate(60)"/>
    <ellipse rx="11" ry="4.2" transform="rotate(120)"/>
  </g>
</svg>
"##;

/// 1x1 transparent PNG.
const ICON_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::config::load_build_config;
    use sprout_static::StaticBuilder;
    use tempfile::tempdir;

    #[test]
    fn writes_starter_files() {
        let temp = tempdir().unwrap();
        let written = scaffold(temp.path(), false).unwrap();

        assert_eq!(written.len(), 6);
        assert!(temp.path().join("src/assets/react-js-icon.png").exists());
    }

    #[test]
    fn keeps_existing_files_without_overwrite() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("sprout.toml"), "# mine\n").unwrap();

        let written = scaffold(temp.path(), false).unwrap();

        assert_eq!(written.len(), 5);
        assert_eq!(
            fs::read_to_string(temp.path().join("sprout.toml")).unwrap(),
            "# mine\n"
        );

        assert_eq!(scaffold(temp.path(), true).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn scaffolded_project_builds() {
        let temp = tempdir().unwrap();
        scaffold(temp.path(), false).unwrap();

        let config = load_build_config(&temp.path().join("sprout.toml")).unwrap();
        let result = StaticBuilder::new(config).build().await.unwrap();

        assert_eq!(result.pages, 3);
        assert_eq!(result.resources, 1);

        let html = fs::read_to_string(result.output_dir.join("index.html")).unwrap();
        assert!(html.contains("<title>Sprout App</title>"));
        assert!(html.contains("Loading..."));
        assert!(html.contains("<script src=\"/bundle.js\"></script>"));
    }
}
