//! File-type rules mapping source paths to loading strategies.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// How a matched file ends up in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Compiled into the script bundle
    Compile,
    /// Injected into the page as a `<style>` tag
    Style,
    /// Copied to the output directory under a content-hashed name
    Resource,
    /// Embedded as a base64 data URI
    Inline,
}

/// A single rule: files whose path matches `test` (and not `exclude`) use `strategy`.
#[derive(Debug, Clone)]
pub struct Rule {
    test: Regex,
    exclude: Option<Regex>,
    strategy: LoadStrategy,
}

impl Rule {
    pub fn new(test: &str, strategy: LoadStrategy) -> Result<Self, PipelineError> {
        Ok(Self {
            test: compile(test)?,
            exclude: None,
            strategy,
        })
    }

    pub fn exclude(mut self, pattern: &str) -> Result<Self, PipelineError> {
        self.exclude = Some(compile(pattern)?);
        Ok(self)
    }

    pub fn strategy(&self) -> LoadStrategy {
        self.strategy
    }

    pub fn test_pattern(&self) -> &str {
        self.test.as_str()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.test.is_match(path)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }
}

fn compile(pattern: &str) -> Result<Regex, PipelineError> {
    Regex::new(pattern).map_err(|e| PipelineError::InvalidRule {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// A rule as written in `sprout.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub test: String,
    #[serde(default)]
    pub exclude: Option<String>,
    pub strategy: LoadStrategy,
}

impl TryFrom<&RuleConfig> for Rule {
    type Error = PipelineError;

    fn try_from(config: &RuleConfig) -> Result<Self, Self::Error> {
        let rule = Rule::new(&config.test, config.strategy)?;
        match &config.exclude {
            Some(pattern) => rule.exclude(pattern),
            None => Ok(rule),
        }
    }
}

/// Outcome of classifying a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub strategy: LoadStrategy,
    /// A script that matched the compile rule but sits in an excluded directory.
    /// It is bundled as written, without environment substitution.
    pub excluded: bool,
}

/// Ordered rules; the first match wins.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The built-in rules with `configs` placed in front of them.
    pub fn with_overrides(configs: &[RuleConfig]) -> Result<Self, PipelineError> {
        let mut rules = configs
            .iter()
            .map(Rule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        rules.extend(Self::default().rules);
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Pick the strategy for `path`, given relative to the project root so
    /// that exclude patterns only see the project's own directories.
    pub fn classify(&self, path: &Path) -> Result<Classification, PipelineError> {
        let normalized = path.to_string_lossy().replace('\\', "/");

        for rule in self.rules.iter().filter(|r| r.matches(&normalized)) {
            if !rule.is_excluded(&normalized) {
                return Ok(Classification {
                    strategy: rule.strategy,
                    excluded: false,
                });
            }
            if rule.strategy == LoadStrategy::Compile {
                return Ok(Classification {
                    strategy: LoadStrategy::Compile,
                    excluded: true,
                });
            }
        }

        Err(PipelineError::UnsupportedFileType(normalized))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        let builtin = [
            (r"\.(js|mjs|ts|mts)$", LoadStrategy::Compile, Some("node_modules")),
            (r"\.css$", LoadStrategy::Style, None),
            (r"(?i)\.(ico|gif|png|jpg|jpeg)$", LoadStrategy::Resource, None),
            (r"\.(woff2?|eot|ttf|otf|svg)$", LoadStrategy::Inline, None),
        ];

        let rules = builtin
            .into_iter()
            .filter_map(|(test, strategy, exclude)| {
                let rule = Rule::new(test, strategy).ok()?;
                match exclude {
                    Some(pattern) => rule.exclude(pattern).ok(),
                    None => Some(rule),
                }
            })
            .collect();

        Self { rules }
    }
}
