//! Synchronous, non-watching loader.

use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::resolve::{check_roots, first_match};
use crate::{LoadError, TemplateLoader};

/// Resolves template names against ordered roots with no filesystem
/// observation.
///
/// Sources are read on demand; callers are expected to cache compiled
/// templates themselves (the rendering environment does). This is the loader
/// to use in production where template files do not change underneath a
/// running process.
///
/// # Example
///
/// ```rust,ignore
/// use viewbind_loader::{FsLoader, TemplateLoader};
///
/// let loader = FsLoader::new(vec!["./templates".into()])?;
/// if let Some(source) = loader.load("index.html")? {
///     // feed to the engine
/// }
/// ```
#[derive(Debug)]
pub struct FsLoader {
    roots: Vec<PathBuf>,
}

impl FsLoader {
    /// Creates a loader over the given roots.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NoRoots`] for an empty list and
    /// [`LoadError::NotADirectory`] when any root is missing or not a
    /// directory.
    pub fn new(roots: Vec<PathBuf>) -> Result<Self, LoadError> {
        check_roots(&roots)?;
        debug!("fs loader over {} root(s)", roots.len());
        Ok(Self { roots })
    }
}

impl TemplateLoader for FsLoader {
    fn load(&self, name: &str) -> Result<Option<String>, LoadError> {
        match first_match(&self.roots, name)? {
            Some(path) => {
                let source = fs::read_to_string(&path).map_err(|e| LoadError::io(path, e))?;
                Ok(Some(source))
            }
            None => Ok(None),
        }
    }

    fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}
