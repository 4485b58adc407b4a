//! Build-time environment strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Build mode tag, substituted wherever `process.env.NODE_ENV` appears.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildMode {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(EnvError::UnknownMode(other.to_string())),
        }
    }
}

/// Errors raised while reading environment strings.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("Unknown build mode '{0}' (expected 'development' or 'production')")]
    UnknownMode(String),
}

/// Read-only strings injected at build time and interpolated into pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Build mode tag
    #[serde(default)]
    pub mode: BuildMode,

    /// Arbitrary named value, exposed to scripts as `process.env.name`
    #[serde(default)]
    pub name: String,
}

impl Environment {
    pub fn new(mode: BuildMode, name: impl Into<String>) -> Self {
        Self {
            mode,
            name: name.into(),
        }
    }

    /// Apply `SPROUT_MODE` / `SPROUT_NAME` overrides from the process environment.
    pub fn with_process_overrides(self) -> Result<Self, EnvError> {
        self.with_overrides(
            std::env::var("SPROUT_MODE").ok(),
            std::env::var("SPROUT_NAME").ok(),
        )
    }

    /// Apply optional overrides, leaving unset values untouched.
    pub fn with_overrides(
        mut self,
        mode: Option<String>,
        name: Option<String>,
    ) -> Result<Self, EnvError> {
        if let Some(mode) = mode {
            self.mode = mode.parse()?;
        }
        if let Some(name) = name {
            self.name = name;
        }
        Ok(self)
    }

    /// Script identifiers replaced by string literals during compilation.
    pub fn defines(&self) -> Vec<(String, String)> {
        vec![
            ("process.env.NODE_ENV".to_string(), self.mode.to_string()),
            ("process.env.name".to_string(), self.name.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_modes() {
        assert_eq!("production".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert_eq!("Dev".parse::<BuildMode>().unwrap(), BuildMode::Development);
        assert!("staging".parse::<BuildMode>().is_err());
    }

    #[test]
    fn overrides_only_set_values() {
        let env = Environment::new(BuildMode::Development, "abc")
            .with_overrides(Some("production".to_string()), None)
            .unwrap();

        assert_eq!(env.mode, BuildMode::Production);
        assert_eq!(env.name, "abc");
    }

    #[test]
    fn exposes_defines_for_scripts() {
        let env = Environment::new(BuildMode::Production, "abc");
        let defines = env.defines();

        assert!(defines.contains(&("process.env.NODE_ENV".to_string(), "production".to_string())));
        assert!(defines.contains(&("process.env.name".to_string(), "abc".to_string())));
    }
}
