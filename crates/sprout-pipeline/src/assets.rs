//! Asset processing for styles, copied resources and inlined data.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use base64::Engine;
use regex::Regex;

use crate::error::PipelineError;
use crate::rules::{LoadStrategy, RuleSet};

/// An asset after its rule has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedAsset {
    /// Written to the output directory as `file_name`, served at `url`
    Resource {
        file_name: String,
        url: String,
        bytes: Vec<u8>,
    },
    /// Embedded in place
    Inline { data_uri: String },
    /// Style sheet injected by the bundle
    Style { css: String },
}

impl ProcessedAsset {
    /// What an `<img src>` or a default import resolves to.
    pub fn reference(&self) -> Option<&str> {
        match self {
            ProcessedAsset::Resource { url, .. } => Some(url),
            ProcessedAsset::Inline { data_uri } => Some(data_uri),
            ProcessedAsset::Style { .. } => None,
        }
    }
}

/// Applies the rule set to non-script files.
#[derive(Debug, Clone)]
pub struct AssetPipeline {
    rules: RuleSet,
    public_path: String,
    minify: bool,
}

impl AssetPipeline {
    pub fn new(rules: RuleSet, public_path: impl Into<String>, minify: bool) -> Self {
        Self {
            rules,
            public_path: public_path.into(),
            minify,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// Process the file at `path`, reading it from disk.
    pub fn process(&self, path: &Path) -> Result<ProcessedAsset, PipelineError> {
        let classified = self.rules.classify(path)?;

        match classified.strategy {
            LoadStrategy::Compile => Err(PipelineError::NotAScript(path.display().to_string())),
            LoadStrategy::Style => {
                let css = fs::read_to_string(path).map_err(|e| PipelineError::read(path, e))?;
                let css = if self.minify {
                    Self::minify_css(&css).map_err(|message| PipelineError::StyleError {
                        path: path.display().to_string(),
                        message,
                    })?
                } else {
                    css
                };
                Ok(ProcessedAsset::Style { css })
            }
            LoadStrategy::Resource => {
                let bytes = fs::read(path).map_err(|e| PipelineError::read(path, e))?;
                let file_name = hashed_file_name(path, &bytes);
                let url = format!("{}{}", self.public_path, file_name);
                tracing::debug!("Resource {} -> {}", path.display(), url);
                Ok(ProcessedAsset::Resource {
                    file_name,
                    url,
                    bytes,
                })
            }
            LoadStrategy::Inline => {
                let bytes = fs::read(path).map_err(|e| PipelineError::read(path, e))?;
                Ok(ProcessedAsset::Inline {
                    data_uri: data_uri(path, &bytes),
                })
            }
        }
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, String> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| format!("CSS parse error: {}", e))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| format!("CSS minify error: {}", e))?;

        Ok(minified.code)
    }
}

/// `{stem}.{hash}.{ext}`, hashed over the file contents.
pub fn hashed_file_name(path: &Path, bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes).to_hex();
    let short = &hash.as_str()[..8];

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset");

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}.{}", stem, short, ext.to_ascii_lowercase()),
        None => format!("{}.{}", stem, short),
    }
}

static HASHED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^/\\]+\.[0-9a-f]{8}(\.[a-z0-9]+)?$").expect("Invalid hashed name regex")
});

/// Whether `name` has the shape [`hashed_file_name`] produces.
pub fn is_hashed_file_name(name: &str) -> bool {
    HASHED_NAME_RE.is_match(name)
}

/// Base64 data URI with a MIME type picked from the extension.
pub fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime_type(path), encoded)
}

fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "css" => "text/css",
        "js" | "mjs" | "ts" | "mts" => "text/javascript",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn pipeline(minify: bool) -> AssetPipeline {
        AssetPipeline::new(RuleSet::default(), "/", minify)
    }

    #[test]
    fn copies_raster_images_with_hashed_name() {
        let temp = tempdir().unwrap();
        let png = temp.path().join("logo.png");
        fs::write(&png, b"\x89PNG fake").unwrap();

        let asset = pipeline(false).process(&png).unwrap();

        match asset {
            ProcessedAsset::Resource {
                file_name,
                url,
                bytes,
            } => {
                assert!(file_name.starts_with("logo."));
                assert!(file_name.ends_with(".png"));
                assert_eq!(url, format!("/{}", file_name));
                assert_eq!(bytes, b"\x89PNG fake");
            }
            other => panic!("expected resource, got {:?}", other),
        }
    }

    #[test]
    fn recognizes_hashed_names() {
        let name = hashed_file_name(Path::new("src/assets/react-js-icon.png"), b"png");

        assert!(is_hashed_file_name(&name));
        assert!(!is_hashed_file_name("bundle.js"));
        assert!(!is_hashed_file_name("index.html"));
        assert!(!is_hashed_file_name("notes.backup.txt"));
    }

    #[test]
    fn hashed_name_tracks_content() {
        let path = Path::new("logo.png");

        assert_eq!(hashed_file_name(path, b"a"), hashed_file_name(path, b"a"));
        assert_ne!(hashed_file_name(path, b"a"), hashed_file_name(path, b"b"));
    }

    #[test]
    fn inlines_svg_as_data_uri() {
        let temp = tempdir().unwrap();
        let svg = temp.path().join("logo.svg");
        fs::write(&svg, "<svg></svg>").unwrap();

        let asset = pipeline(false).process(&svg).unwrap();

        assert_eq!(
            asset.reference(),
            Some("data:image/svg+xml;base64,PHN2Zz48L3N2Zz4=")
        );
    }

    #[test]
    fn minifies_styles_when_enabled() {
        let temp = tempdir().unwrap();
        let css = temp.path().join("styles.css");
        fs::write(&css, ".button {\n    padding: 10px;\n}\n").unwrap();

        let ProcessedAsset::Style { css: out } = pipeline(true).process(&css).unwrap() else {
            panic!("expected style");
        };

        assert!(!out.contains('\n'));
        assert!(out.contains(".button"));
    }

    #[test]
    fn keeps_styles_verbatim_without_minify() {
        let temp = tempdir().unwrap();
        let css = temp.path().join("styles.css");
        fs::write(&css, "body { margin: 0; }\n").unwrap();

        let asset = pipeline(false).process(&css).unwrap();

        assert_eq!(
            asset,
            ProcessedAsset::Style {
                css: "body { margin: 0; }\n".to_string()
            }
        );
    }

    #[test]
    fn scripts_are_not_assets() {
        let err = pipeline(false).process(Path::new("src/index.js")).unwrap_err();
        assert!(matches!(err, PipelineError::NotAScript(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = pipeline(false)
            .process(Path::new("does/not/exist.png"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::ReadError { .. }));
    }
}
