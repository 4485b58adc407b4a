//! Build-time failures. All of them abort the build.

/// Errors raised while classifying, processing or compiling source files.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to read {path}: {message}")]
    ReadError { path: String, message: String },

    #[error("No rule handles {0}")]
    UnsupportedFileType(String),

    #[error("Cannot resolve '{specifier}' imported from {importer}")]
    UnresolvedImport { specifier: String, importer: String },

    #[error("Syntax error in {path}: {message}")]
    SyntaxError { path: String, message: String },

    #[error("Unsupported syntax in {path}: {message}")]
    UnsupportedSyntax { path: String, message: String },

    #[error("Invalid style sheet {path}: {message}")]
    StyleError { path: String, message: String },

    #[error("Invalid rule pattern '{pattern}': {message}")]
    InvalidRule { pattern: String, message: String },

    #[error("{0} is not a script")]
    NotAScript(String),
}

impl PipelineError {
    pub(crate) fn read(path: &std::path::Path, err: std::io::Error) -> Self {
        PipelineError::ReadError {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
