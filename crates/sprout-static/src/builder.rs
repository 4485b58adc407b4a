//! Static site builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use sprout_app::{
    App, AssetRef, AssetResolver, Environment, Outlet, Page, Router, LOADING_TEXT,
    LOAD_FAILED_TEXT, NOT_FOUND_DETAIL, NOT_FOUND_TITLE,
};
use sprout_pipeline::assets::is_hashed_file_name;
use sprout_pipeline::{
    normalize_path, AssetPipeline, Bundle, ModuleGraph, PipelineError, ProcessedAsset,
    RuleConfig, RuleSet,
};

use crate::runtime::Runtime;
use crate::templates::{Context, TemplateEngine};

/// File name of the emitted script bundle.
pub const BUNDLE_FILE: &str = "bundle.js";

/// File name of the emitted HTML document.
pub const DOCUMENT_FILE: &str = "index.html";

/// Configuration for building the application.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; relative paths below are resolved against it
    pub root: PathBuf,

    /// Entry script
    pub entry: PathBuf,

    /// Directory page asset references are relative to
    pub src_dir: PathBuf,

    /// HTML document template, used when the file exists
    pub template: PathBuf,

    /// Output directory
    pub output_dir: PathBuf,

    /// URL prefix for emitted files
    pub public_path: String,

    /// Document title
    pub title: String,

    /// Minify injected style sheets
    pub minify: bool,

    /// Build-time environment strings
    pub env: Environment,

    /// Extra rules, checked before the built-in ones
    pub rules: Vec<RuleConfig>,

    /// Additional script URLs loaded after the bundle
    pub extra_scripts: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entry: PathBuf::from("src/index.js"),
            src_dir: PathBuf::from("src"),
            template: PathBuf::from("src/index.html"),
            output_dir: PathBuf::from("dist"),
            public_path: "/".to_string(),
            title: "Sprout App".to_string(),
            minify: true,
            env: Environment::default(),
            rules: vec![],
            extra_scripts: vec![],
        }
    }
}

impl BuildConfig {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Output directory resolved against the project root.
    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.output_dir)
    }

    /// Source directory resolved against the project root.
    pub fn src_path(&self) -> PathBuf {
        self.resolve(&self.src_dir)
    }

    /// Document template resolved against the project root.
    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.template)
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of routed pages rendered
    pub pages: usize,

    /// Number of script modules bundled
    pub modules: usize,

    /// Number of files copied next to the bundle
    pub resources: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Failed to load page: {0}")]
    PageLoad(String),

    #[error("Page asset {0} is not an image or font")]
    InvalidAsset(String),

    #[error("Failed to read {0}")]
    ReadError(String),

    #[error("Failed to render template: {0}")]
    TemplateError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// A routed page rendered to its chunk HTML.
#[derive(Debug, Serialize)]
struct RenderedRoute {
    path: &'static str,
    page: &'static str,
    title: &'static str,
    #[serde(skip)]
    html: String,
}

/// Outlet text shared with the client router.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeText {
    loading: &'static str,
    load_failed: &'static str,
    not_found_title: &'static str,
    not_found_detail: &'static str,
}

impl Default for RuntimeText {
    fn default() -> Self {
        Self {
            loading: LOADING_TEXT,
            load_failed: LOAD_FAILED_TEXT,
            not_found_title: NOT_FOUND_TITLE,
            not_found_detail: NOT_FOUND_DETAIL,
        }
    }
}

/// Asset URLs for page image references.
#[derive(Debug, Default)]
struct ResolvedAssets(BTreeMap<AssetRef, String>);

impl AssetResolver for ResolvedAssets {
    fn resolve(&self, asset: &AssetRef) -> Option<String> {
        self.0.get(asset).cloned()
    }
}

/// Builds the bundle and HTML document.
pub struct StaticBuilder {
    config: BuildConfig,
}

impl StaticBuilder {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Build the application.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let env = &self.config.env;
        let output_dir = self.config.output_path();

        let rules = RuleSet::with_overrides(&self.config.rules)?;
        let pipeline = AssetPipeline::new(rules, &self.config.public_path, self.config.minify);

        tracing::debug!("Compiling {}", self.config.entry.display());
        let graph = ModuleGraph::build(
            &self.config.root,
            &self.config.entry,
            &pipeline,
            &env.defines(),
        )?;

        let mut assets = graph.assets().clone();
        let pages = self.render_pages(&pipeline, &mut assets).await?;

        fs::create_dir_all(&output_dir).map_err(|e| BuildError::WriteError(e.to_string()))?;

        let resources = self.write_resources(&output_dir, &assets)?;

        let bundle = self.render_bundle(&graph, &pages)?;
        fs::write(output_dir.join(BUNDLE_FILE), bundle)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        let document = self.render_document()?;
        fs::write(output_dir.join(DOCUMENT_FILE), document)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        Ok(BuildResult {
            pages: pages.len(),
            modules: graph.modules().len(),
            resources,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir,
        })
    }

    /// Load and render every routed page, resolving its image assets.
    async fn render_pages(
        &self,
        pipeline: &AssetPipeline,
        assets: &mut BTreeMap<PathBuf, ProcessedAsset>,
    ) -> Result<Vec<RenderedRoute>, BuildError> {
        let router = Router::default();
        let src_dir = self.config.src_path();
        let mut rendered = Vec::new();

        for route in router.table().routes() {
            let page = match router.load(route.path).await {
                Outlet::Ready(page) => page,
                Outlet::Failed(err) => return Err(BuildError::PageLoad(err.to_string())),
                other => {
                    return Err(BuildError::PageLoad(format!(
                        "{} resolved to {:?}",
                        route.path, other
                    )))
                }
            };

            let node = page.render(&self.config.env);
            let mut resolved = ResolvedAssets::default();

            for asset in node.assets() {
                let path = normalize_path(&src_dir.join(asset.path()));
                if !assets.contains_key(&path) {
                    assets.insert(path.clone(), pipeline.process(&path)?);
                }
                let reference = assets[&path]
                    .reference()
                    .ok_or_else(|| BuildError::InvalidAsset(path.display().to_string()))?;
                resolved.0.insert(asset, reference.to_string());
            }

            tracing::debug!("Rendered page {} for {}", page.id(), route.path);

            rendered.push(RenderedRoute {
                path: route.path,
                page: page.id().as_str(),
                title: page.title(),
                html: node.to_html(&resolved),
            });
        }

        Ok(rendered)
    }

    /// Copy every resource asset into the output directory, removing hashed
    /// files left behind by earlier builds.
    fn write_resources(
        &self,
        output_dir: &Path,
        assets: &BTreeMap<PathBuf, ProcessedAsset>,
    ) -> Result<usize, BuildError> {
        let resources: Vec<(&String, &Vec<u8>)> = assets
            .values()
            .filter_map(|asset| match asset {
                ProcessedAsset::Resource {
                    file_name, bytes, ..
                } => Some((file_name, bytes)),
                _ => None,
            })
            .collect();

        remove_stale_resources(output_dir, &resources)?;

        resources
            .par_iter()
            .map(|(file_name, bytes)| {
                fs::write(output_dir.join(file_name), bytes)
                    .map_err(|e| BuildError::WriteError(format!("{}: {}", file_name, e)))
            })
            .collect::<Result<Vec<()>, BuildError>>()?;

        Ok(resources.len())
    }

    /// Navigation shell with the loading placeholder in the outlet.
    fn shell_html(&self) -> String {
        App::new(Router::default(), self.config.env.clone())
            .render()
            .to_html(&ResolvedAssets::default())
    }

    fn render_bundle(
        &self,
        graph: &ModuleGraph,
        pages: &[RenderedRoute],
    ) -> Result<String, BuildError> {
        let base_css = if self.config.minify {
            AssetPipeline::minify_css(Runtime::base_css())
                .unwrap_or_else(|_| Runtime::base_css().to_string())
        } else {
            Runtime::base_css().to_string()
        };

        let mut chunks = String::from("var __sprout_pages = {\n");
        for page in pages {
            chunks.push_str(&format!(
                "  {}: function () {{ return Promise.resolve({}); }},\n",
                to_json(&page.page)?,
                to_json(&page.html)?
            ));
        }
        chunks.push_str("};\n");

        let start = format!(
            "__sprout_style({});\n__sprout_start({{ title: {}, shell: {}, routes: {}, text: {}, pages: __sprout_pages }});\n",
            to_json(&base_css)?,
            to_json(&self.config.title)?,
            to_json(&self.shell_html())?,
            to_json(&pages)?,
            to_json(&RuntimeText::default())?,
        );

        Ok(Bundle::new(graph)
            .section("runtime", Runtime::router_js())
            .section("pages", chunks)
            .section("start", start)
            .render())
    }

    fn render_document(&self) -> Result<String, BuildError> {
        let template_path = self.config.template_path();
        let engine = if template_path.is_file() {
            let source = fs::read_to_string(&template_path).map_err(|e| {
                BuildError::ReadError(format!("{}: {}", template_path.display(), e))
            })?;
            TemplateEngine::with_document(source)
                .map_err(|e| BuildError::TemplateError(e.to_string()))?
        } else {
            TemplateEngine::new()
        };

        let mut scripts = vec![format!("{}{}", self.config.public_path, BUNDLE_FILE)];
        scripts.extend(self.config.extra_scripts.iter().cloned());

        let context = Context {
            title: self.config.title.clone(),
            app: self.shell_html(),
            mode: self.config.env.mode.to_string(),
            name: self.config.env.name.clone(),
            scripts,
        };

        engine
            .render_document(&context)
            .map_err(|e| BuildError::TemplateError(e.to_string()))
    }
}

/// Delete hashed resource files in `output_dir` that this build does not write.
fn remove_stale_resources(
    output_dir: &Path,
    current: &[(&String, &Vec<u8>)],
) -> Result<(), BuildError> {
    let entries = fs::read_dir(output_dir).map_err(|e| BuildError::WriteError(e.to_string()))?;

    for entry in entries.filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_current = current.iter().any(|(file_name, _)| **file_name == name);
        if is_current || !is_hashed_file_name(&name) || !entry.path().is_file() {
            continue;
        }

        tracing::debug!("Removing stale {}", name);
        fs::remove_file(entry.path())
            .map_err(|e| BuildError::WriteError(format!("{}: {}", name, e)))?;
    }

    Ok(())
}

/// Serialize a value as a JavaScript literal.
fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, BuildError> {
    serde_json::to_string(value).map_err(|e| BuildError::WriteError(e.to_string()))
}
