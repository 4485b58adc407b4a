//! Static builder for sprout applications.
//!
//! Compiles the entry script's import graph, renders every routed page into a
//! lazily loaded chunk and writes one bundle plus one HTML document.

pub mod builder;
pub mod runtime;
pub mod templates;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
