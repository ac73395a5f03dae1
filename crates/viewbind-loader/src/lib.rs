//! # viewbind-loader - Multi-Root Template Source Resolution
//!
//! This crate resolves template names to source text across an ordered list
//! of root directories. It is the loading half of the `viewbind` view-engine
//! binding, kept as its own crate so that alternate strategies can be swapped
//! in without touching the rendering side.
//!
//! ## Core Concepts
//!
//! - [`TemplateLoader`]: the loading contract — resolve a name, report
//!   whether cached state should be invalidated
//! - [`FsLoader`]: synchronous, no filesystem observation
//! - [`WatchLoader`]: fingerprint-based invalidation and cache bypass
//! - [`LoaderOptions`]: `watch` / `no_cache` knobs consumed by [`WatchLoader`]
//!
//! ## Resolution Rules
//!
//! Roots are searched in the order they were supplied; the first root
//! containing the requested relative name wins. A name that matches no root
//! resolves to `Ok(None)` — callers surface that as a template-not-found
//! error, never as empty output.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use viewbind_loader::{FsLoader, TemplateLoader};
//!
//! let loader = FsLoader::new(vec!["./templates".into(), "./shared".into()])?;
//! let source = loader.load("index.html")?; // Some(text) from the first match
//! ```

mod error;
mod fs;
mod resolve;
mod watch;

pub use error::LoadError;
pub use fs::FsLoader;
pub use watch::WatchLoader;

/// Behavior knobs for loaders that support observation and cache control.
///
/// Both flags default to off, which makes [`WatchLoader`] behave like
/// [`FsLoader`] with fingerprint bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Re-check previously loaded files for changes on each invalidation poll.
    pub watch: bool,
    /// Bypass caching entirely: every poll reports stale, forcing a re-read.
    pub no_cache: bool,
}

/// The loading contract shared by all loader strategies.
///
/// Implementations must be `Send + Sync`: the rendering environment hands the
/// loader to the template engine, which requires a thread-safe source.
pub trait TemplateLoader: Send + Sync {
    /// Resolves a template name to its source text.
    ///
    /// Returns `Ok(None)` when no root contains the name. Errors are reserved
    /// for names that cannot be resolved at all (I/O failures, invalid names).
    fn load(&self, name: &str) -> Result<Option<String>, LoadError>;

    /// Reports whether previously loaded templates may be stale.
    ///
    /// The rendering side polls this before each render and drops its
    /// compiled-template cache when it returns `true`. The default
    /// implementation never invalidates.
    fn needs_reload(&self) -> bool {
        false
    }

    /// The ordered root directories this loader searches.
    fn roots(&self) -> &[std::path::PathBuf];
}
