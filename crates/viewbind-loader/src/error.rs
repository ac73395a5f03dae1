//! Error types for template loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while constructing a loader or reading template sources.
///
/// A name that simply matches no root is not an error at this layer; loaders
/// report it as `Ok(None)` and the rendering side turns it into its own
/// not-found condition.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The loader was constructed with an empty root list.
    #[error("no template roots configured")]
    NoRoots,

    /// A configured root exists but is not a directory (or does not exist).
    #[error("template root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The requested name contains segments that must not leave the roots
    /// (absolute paths, `..`, empty or backslash segments).
    #[error("invalid template name: {0:?}")]
    InvalidName(String),

    /// A matched file could not be read.
    #[error("failed to read template {path}: {message}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl LoadError {
    pub(crate) fn io(path: PathBuf, err: std::io::Error) -> Self {
        LoadError::Io {
            path,
            message: err.to_string(),
        }
    }
}
