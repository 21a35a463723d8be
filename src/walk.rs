//! Directory walker.
//!
//! Enumerates every file and directory under the root, depth-first, siblings
//! in file-name order. The walk is lazy: entries are classified as they are
//! read, so callers can stop early or collect as they see fit.
//!
//! ## Exclusions
//!
//! Pruned entries are not yielded, and pruned directories are not descended:
//!
//! - the thumbnail cache, by its reserved name (`.thumbnails`) at any depth,
//!   and by path when a custom cache root lies inside the tree
//! - forbidden names: a leading `.` (hidden files, `.`/`..`), or a trailing `..`
//!
//! ## Failure policy
//!
//! Only an unreadable root is an error. A subdirectory that cannot be read
//! is logged and skipped; the rest of the tree is still walked. Symlinked
//! directories are not followed.

use crate::config::CACHE_DIR_NAME;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// File extensions indexed as images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp", "tiff"];

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("cannot open root {}: {source}", path.display())]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Image,
    Directory,
    Ignored,
}

/// One entry below the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// Path relative to the root, `/`-separated on every platform.
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub kind: EntryKind,
}

/// Walk `root`, skipping the cache at `cache_root` if it lies inside the tree.
pub fn walk(
    root: &Path,
    cache_root: &Path,
) -> Result<impl Iterator<Item = WalkEntry> + use<>, WalkError> {
    walk_to_depth(root, cache_root, usize::MAX)
}

/// Only the entries directly under `root`, with the same exclusions as [`walk`].
pub fn walk_top_level(
    root: &Path,
    cache_root: &Path,
) -> Result<impl Iterator<Item = WalkEntry> + use<>, WalkError> {
    walk_to_depth(root, cache_root, 1)
}

fn walk_to_depth(
    root: &Path,
    cache_root: &Path,
    max_depth: usize,
) -> Result<impl Iterator<Item = WalkEntry> + use<>, WalkError> {
    // walkdir reports an unreadable root as just another entry error; probe
    // it first so it can abort the walk.
    std::fs::read_dir(root).map_err(|source| WalkError::RootUnavailable {
        path: root.to_path_buf(),
        source,
    })?;

    let root = root.to_path_buf();
    let prune_root = root.clone();
    let cache_rel = cache_location(&root, cache_root);

    let entries = WalkDir::new(&root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |entry| !is_pruned(entry, &prune_root, cache_rel.as_deref()))
        .filter_map(|result| match result {
            Ok(entry) => Some(entry),
            Err(err) => {
                let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                warn!(%path, error = %err, "skipping unreadable entry");
                None
            }
        })
        .map(move |entry| classify(&root, &entry));

    Ok(entries)
}

/// Where the cache root sits inside the tree, relative to the root.
///
/// Compared on canonical paths when both exist, so `./outputs/.thumbs` and an
/// absolute spelling of the same directory match.
fn cache_location(root: &Path, cache_root: &Path) -> Option<PathBuf> {
    let relative = match (root.canonicalize(), cache_root.canonicalize()) {
        (Ok(root), Ok(cache)) => cache.strip_prefix(&root).ok().map(Path::to_path_buf),
        _ => cache_root.strip_prefix(root).ok().map(Path::to_path_buf),
    };
    relative.filter(|p| !p.as_os_str().is_empty())
}

fn is_pruned(entry: &DirEntry, root: &Path, cache_rel: Option<&Path>) -> bool {
    let name = entry.file_name().to_string_lossy();
    if is_forbidden_name(&name) || name == CACHE_DIR_NAME {
        return true;
    }
    cache_rel.is_some_and(|cache| {
        entry
            .path()
            .strip_prefix(root)
            .is_ok_and(|relative| relative == cache)
    })
}

fn classify(root: &Path, entry: &DirEntry) -> WalkEntry {
    let path = entry.path();
    let relative = path.strip_prefix(root).unwrap_or(path);
    let relative_path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    let file_type = entry.file_type();
    let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
    let kind = if file_type.is_dir() {
        EntryKind::Directory
    } else if is_file && is_image_name(&relative_path) {
        EntryKind::Image
    } else {
        EntryKind::Ignored
    };

    WalkEntry {
        relative_path,
        absolute_path: path.to_path_buf(),
        kind,
    }
}

/// Whether a file name (or path) carries one of [`IMAGE_EXTENSIONS`].
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|i| ext.eq_ignore_ascii_case(i)))
}

/// Names the walker never yields and uploads may not create.
pub fn is_forbidden_name(name: &str) -> bool {
    name.starts_with('.') || name.ends_with("..")
}
