//! Name sanitation and first-match resolution across ordered roots.

use std::path::{Path, PathBuf};

use log::trace;

use crate::LoadError;

/// Turns a template name into a safe relative path.
///
/// Names use `/` as the separator regardless of platform. Rejected outright:
/// absolute names, `..` segments, empty segments, and segments containing
/// backslashes. `.` segments are dropped.
pub(crate) fn sanitize(name: &str) -> Result<PathBuf, LoadError> {
    if name.is_empty() || name.starts_with('/') {
        return Err(LoadError::InvalidName(name.to_string()));
    }

    let mut rel = PathBuf::new();
    for segment in name.split('/') {
        match segment {
            "." => continue,
            "" | ".." => return Err(LoadError::InvalidName(name.to_string())),
            seg if seg.contains('\\') => {
                return Err(LoadError::InvalidName(name.to_string()));
            }
            seg => rel.push(seg),
        }
    }

    if rel.as_os_str().is_empty() {
        return Err(LoadError::InvalidName(name.to_string()));
    }

    Ok(rel)
}

/// Probes the roots in order and returns the first existing file.
pub(crate) fn first_match(roots: &[PathBuf], name: &str) -> Result<Option<PathBuf>, LoadError> {
    let rel = sanitize(name)?;

    for root in roots {
        let candidate = root.join(&rel);
        if candidate.is_file() {
            trace!("resolved {:?} in {}", name, root.display());
            return Ok(Some(candidate));
        }
    }

    trace!("no root contains {:?}", name);
    Ok(None)
}

/// Validates that each root exists and is a directory.
///
/// Construction-time check shared by all loader strategies; a missing root is
/// a configuration error, not something to paper over at lookup time.
pub(crate) fn check_roots(roots: &[PathBuf]) -> Result<(), LoadError> {
    if roots.is_empty() {
        return Err(LoadError::NoRoots);
    }
    for root in roots {
        if !Path::new(root).is_dir() {
            return Err(LoadError::NotADirectory(root.clone()));
        }
    }
    Ok(())
}
