//! Watching / cache-bypassing loader.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

use log::debug;

use crate::resolve::{check_roots, first_match};
use crate::{LoadError, LoaderOptions, TemplateLoader};

/// Content fingerprint used to detect changed files: modification time plus
/// byte length. Cheap to take (a single `stat`) and good enough for editor
/// saves; a same-length same-mtime rewrite is not detectable, matching what
/// mtime-based template caches accept everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    mtime: Option<SystemTime>,
    len: u64,
}

impl Fingerprint {
    fn of(path: &PathBuf) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            mtime: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Loader with change observation and optional cache bypass.
///
/// Instead of running a watcher thread, this loader records a fingerprint for
/// every file it hands out and re-stats those files when polled via
/// [`TemplateLoader::needs_reload`]. The rendering side polls before each
/// render, so a changed template is picked up on the next request — the same
/// re-read-on-render model used for development hot reloading.
///
/// With [`LoaderOptions::no_cache`] the poll always reports stale, which makes
/// every render re-read from disk.
#[derive(Debug)]
pub struct WatchLoader {
    roots: Vec<PathBuf>,
    opts: LoaderOptions,
    /// Files handed out so far, with the fingerprint taken at load time.
    seen: Mutex<HashMap<PathBuf, Fingerprint>>,
}

impl WatchLoader {
    /// Creates a watching loader over the given roots.
    ///
    /// # Errors
    ///
    /// Same construction rules as [`crate::FsLoader::new`]: the root list must
    /// be non-empty and every root must be a directory.
    pub fn new(roots: Vec<PathBuf>, opts: LoaderOptions) -> Result<Self, LoadError> {
        check_roots(&roots)?;
        debug!(
            "watch loader over {} root(s) (watch={}, no_cache={})",
            roots.len(),
            opts.watch,
            opts.no_cache
        );
        Ok(Self {
            roots,
            opts,
            seen: Mutex::new(HashMap::new()),
        })
    }

    /// The options this loader was constructed with.
    pub fn options(&self) -> LoaderOptions {
        self.opts
    }
}

impl TemplateLoader for WatchLoader {
    fn load(&self, name: &str) -> Result<Option<String>, LoadError> {
        match first_match(&self.roots, name)? {
            Some(path) => {
                let source =
                    fs::read_to_string(&path).map_err(|e| LoadError::io(path.clone(), e))?;
                if let Some(fp) = Fingerprint::of(&path) {
                    self.seen
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .insert(path, fp);
                }
                Ok(Some(source))
            }
            None => Ok(None),
        }
    }

    fn needs_reload(&self) -> bool {
        if self.opts.no_cache {
            return true;
        }
        if !self.opts.watch {
            return false;
        }

        let mut seen = self
            .seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut stale = false;
        for (path, fp) in seen.iter() {
            if Fingerprint::of(path).as_ref() != Some(fp) {
                debug!("template changed on disk: {}", path.display());
                stale = true;
                break;
            }
        }
        if stale {
            // Fingerprints are re-recorded as files are re-loaded.
            seen.clear();
        }
        stale
    }

    fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}
