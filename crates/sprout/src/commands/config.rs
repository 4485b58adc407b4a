//! Project configuration (sprout.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sprout_app::Environment;
use sprout_pipeline::RuleConfig;
use sprout_static::BuildConfig;

/// Configuration file structure (sprout.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub project: ProjectSettings,
    #[serde(default)]
    pub env: Environment,
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectSettings {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_public_path")]
    pub public_path: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            entry: default_entry(),
            template: default_template(),
            output: default_output(),
            title: default_title(),
            public_path: default_public_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_minify")]
    pub minify: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            minify: default_minify(),
        }
    }
}

fn default_root() -> String {
    ".".to_string()
}
fn default_entry() -> String {
    "src/index.js".to_string()
}
fn default_template() -> String {
    "src/index.html".to_string()
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_title() -> String {
    "Sprout App".to_string()
}
fn default_public_path() -> String {
    "/".to_string()
}
fn default_minify() -> bool {
    true
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the config file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Turn the file settings into a build configuration.
    ///
    /// `[project] root` is relative to the directory holding the config file.
    /// `SPROUT_MODE` / `SPROUT_NAME` override `[env]`.
    pub fn into_build_config(self, config_path: &Path) -> Result<BuildConfig> {
        let base = match config_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let env = self
            .env
            .with_process_overrides()
            .context("Invalid SPROUT_MODE")?;

        Ok(BuildConfig {
            root: base.join(&self.project.root),
            entry: PathBuf::from(&self.project.entry),
            template: PathBuf::from(&self.project.template),
            output_dir: PathBuf::from(&self.project.output),
            public_path: self.project.public_path,
            title: self.project.title,
            minify: self.build.minify,
            env,
            rules: self.rules,
            ..Default::default()
        })
    }
}

/// Load `path` and apply environment overrides.
pub fn load_build_config(path: &Path) -> Result<BuildConfig> {
    ConfigFile::load(path)?.into_build_config(path)
}
