//! Import graph discovery starting from the entry script.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::assets::{AssetPipeline, ProcessedAsset};
use crate::error::PipelineError;
use crate::rules::LoadStrategy;
use crate::script::{parse_module, ImportTarget};

/// Extensions tried, in order, when an import omits one.
pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "js", "mjs"];

/// A compiled module.
#[derive(Debug, Clone)]
pub struct Module {
    /// Position in discovery order; the entry is 0
    pub id: usize,
    pub path: PathBuf,
    /// Path relative to the project root, with forward slashes
    pub key: String,
    pub code: String,
}

/// Every module and asset reachable from the entry.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    assets: BTreeMap<PathBuf, ProcessedAsset>,
}

impl ModuleGraph {
    /// Walk the imports of `entry`, compiling scripts and processing assets.
    pub fn build(
        root: &Path,
        entry: &Path,
        pipeline: &AssetPipeline,
        defines: &[(String, String)],
    ) -> Result<Self, PipelineError> {
        let entry = normalize_path(&root.join(entry));
        if !entry.is_file() {
            return Err(PipelineError::ReadError {
                path: entry.display().to_string(),
                message: "entry file not found".to_string(),
            });
        }

        let mut ids: BTreeMap<PathBuf, usize> = BTreeMap::new();
        let mut pending: Vec<Option<Module>> = Vec::new();
        let mut assets = BTreeMap::new();
        let mut queue = VecDeque::new();

        ids.insert(entry.clone(), 0);
        pending.push(None);
        queue.push_back(entry);

        while let Some(path) = queue.pop_front() {
            let id = ids[&path];
            let key = relative_key(root, &path);
            let classified = pipeline.rules().classify(Path::new(&key))?;
            if classified.strategy != LoadStrategy::Compile {
                return Err(PipelineError::NotAScript(path.display().to_string()));
            }

            let source = fs::read_to_string(&path).map_err(|e| PipelineError::read(&path, e))?;
            let no_defines: &[(String, String)] = &[];
            let parsed = parse_module(
                &path,
                &source,
                if classified.excluded { no_defines } else { defines },
            )?;

            let mut targets = Vec::with_capacity(parsed.imports().len());
            for import in parsed.imports() {
                let resolved = resolve(&path, &import.specifier)?;
                let strategy = pipeline
                    .rules()
                    .classify(Path::new(&relative_key(root, &resolved)))?
                    .strategy;

                let target = if strategy == LoadStrategy::Compile {
                    let next_id = ids.len();
                    let module_id = *ids.entry(resolved.clone()).or_insert_with(|| {
                        pending.push(None);
                        queue.push_back(resolved.clone());
                        next_id
                    });
                    ImportTarget::Module(module_id)
                } else {
                    if !assets.contains_key(&resolved) {
                        let processed = pipeline.process(&resolved)?;
                        assets.insert(resolved.clone(), processed);
                    }
                    match &assets[&resolved] {
                        ProcessedAsset::Style { css } => ImportTarget::Style(css.clone()),
                        other => ImportTarget::Asset(
                            other.reference().unwrap_or_default().to_string(),
                        ),
                    }
                };
                targets.push(target);
            }

            tracing::debug!("Compiled module {} ({})", id, path.display());

            pending[id] = Some(Module {
                id,
                key,
                code: parsed.rewrite(&targets),
                path,
            });
        }

        Ok(Self {
            modules: pending.into_iter().flatten().collect(),
            assets,
        })
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn entry(&self) -> Option<&Module> {
        self.modules.first()
    }

    pub fn assets(&self) -> &BTreeMap<PathBuf, ProcessedAsset> {
        &self.assets
    }

    /// Style sheets reachable from the entry, sorted by path.
    pub fn styles(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.assets.iter().filter_map(|(path, asset)| match asset {
            ProcessedAsset::Style { css } => Some((path.as_path(), css.as_str())),
            _ => None,
        })
    }
}

/// Resolve a relative import specifier against the importing file.
fn resolve(importer: &Path, specifier: &str) -> Result<PathBuf, PipelineError> {
    let unresolved = || PipelineError::UnresolvedImport {
        specifier: specifier.to_string(),
        importer: importer.display().to_string(),
    };

    if !(specifier.starts_with("./") || specifier.starts_with("../")) {
        return Err(unresolved());
    }

    let base = importer.parent().unwrap_or(Path::new(""));
    let candidate = normalize_path(&base.join(specifier));

    if candidate.is_file() {
        return Ok(candidate);
    }

    for ext in RESOLVE_EXTENSIONS {
        let mut with_ext = candidate.clone().into_os_string();
        with_ext.push(".");
        with_ext.push(ext);
        let with_ext = PathBuf::from(with_ext);
        if with_ext.is_file() {
            return Ok(with_ext);
        }
    }

    for ext in RESOLVE_EXTENSIONS {
        let index = candidate.join(format!("index.{}", ext));
        if index.is_file() {
            return Ok(index);
        }
    }

    Err(unresolved())
}

/// Lexically remove `.` and `..` components.
///
/// Assets are keyed by the normalized path, so every caller that looks one
/// up must normalize the same way.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn relative_key(root: &Path, path: &Path) -> String {
    let root = normalize_path(root);
    path.strip_prefix(&root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
