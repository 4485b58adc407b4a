//! File-type rules, asset processing and script bundling.
//!
//! Every file the build touches is classified by a [`RuleSet`] into a
//! [`LoadStrategy`]: scripts (JavaScript or TypeScript) are compiled into the
//! bundle, style sheets are injected at runtime, raster images are copied to
//! the output and fonts or vectors are inlined as data URIs.

pub mod assets;
pub mod bundle;
pub mod error;
pub mod graph;
pub mod rules;
pub mod script;

pub use assets::{AssetPipeline, ProcessedAsset};
pub use bundle::Bundle;
pub use error::PipelineError;
pub use graph::{normalize_path, Module, ModuleGraph};
pub use rules::{Classification, LoadStrategy, Rule, RuleConfig, RuleSet};
pub use script::{parse_module, strip_types, Binding, Import, ImportTarget, ParsedModule};
