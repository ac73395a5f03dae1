//! Error types for view binding and rendering.
//!
//! [`ViewError`] is the single public error type. It abstracts over the
//! underlying engine's errors so the engine never leaks into the public API,
//! and it separates usage errors (wrong API use, raised synchronously at the
//! call site) from resolution errors (surfaced through a render attempt's
//! error channel). Nothing in this crate retries; every failure is reported
//! to the nearest caller.

use thiserror::Error;
use viewbind_loader::LoadError;

/// Error type for all view-binding operations.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The registration entry point was called with zero applications.
    #[error("at least one application is required")]
    NoApplications,

    /// The same application was registered twice in one pending cycle.
    ///
    /// Identity is handle identity, not configuration equality; two distinct
    /// apps with identical template roots are fine.
    #[error("application is already registered in this cycle")]
    DuplicateApp,

    /// `setup` was called again on a facade whose environment already exists
    /// and which does not permit re-setup.
    #[error("environment already initialized; setup cannot run twice")]
    AlreadyInitialized,

    /// The application has no render callback installed under its configured
    /// view-engine extension.
    #[error("no view engine installed for extension {0:?}")]
    NoEngine(String),

    /// The template name matched no root.
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Template syntax error, compilation failure, or render-time failure.
    #[error("template error: {0}")]
    Template(String),

    /// Loader construction or source reading failed.
    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<minijinja::Error> for ViewError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;

        match err.kind() {
            ErrorKind::TemplateNotFound => {
                ViewError::TemplateNotFound(err.detail().unwrap_or("unknown template").to_string())
            }
            _ => ViewError::Template(err.to_string()),
        }
    }
}
