//! Upload placement.
//!
//! Files arriving from outside (the HTTP layer, or `gallery-index add`) are
//! placed into the tree under a sanitized name and get their thumbnail
//! immediately, so the next catalog scan finds both in place.
//!
//! ```text
//! "Summer Trip" + "beach (1).JPG"  →  Summer_Trip/beach_1.JPG
//! ```
//!
//! Names go through [`sanitize_input`]: every run of path separators,
//! wildcard and quote characters, dots, whitespace and parentheses collapses
//! to one `_`, and leading or trailing `_` are dropped. The original
//! extension is kept as given.
//!
//! A file with the same name in the same collection is replaced. Its old
//! thumbnail stays valid under the path-only cache key unless
//! `thumbnails.refresh_stale` is set.

use crate::cache::ThumbnailError;
use crate::catalog::Catalog;
use crate::config::ROOT_COLLECTION;
use crate::imaging::ImageBackend;
use crate::walk::{is_forbidden_name, is_image_name};
use serde::Serialize;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),
    #[error("invalid collection name: {0:?}")]
    InvalidCollection(String),
    #[error("file is {size} bytes, the limit is {limit}")]
    TooLarge { size: u64, limit: u64 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("stored {relative_path}, but its thumbnail failed: {source}")]
    Thumbnail {
        relative_path: String,
        #[source]
        source: ThumbnailError,
    },
}

/// Where an upload goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionTarget {
    Root,
    /// A collection picked from the list; created if it has gone missing.
    ///
    /// A name that sanitizes to nothing is rejected as `InvalidCollection`
    /// rather than falling back to the root.
    Existing(String),
    New(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub file_name: String,
    /// Collection name, `"root"` for the top level.
    pub collection: String,
    pub relative_path: String,
}

/// Make user-supplied text safe to use as a single path segment.
///
/// Returns an empty string when nothing usable is left.
pub fn sanitize_input(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if is_replaced(c) {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.trim_matches('_').to_string()
}

fn is_replaced(c: char) -> bool {
    matches!(
        c,
        '/' | '?' | '<' | '>' | '\\' | ':' | '*' | '|' | '"' | '\'' | '.' | '(' | ')'
    ) || c.is_whitespace()
}

/// Sanitized collection directory for `target`; `None` is the root.
fn resolve_collection(target: &CollectionTarget) -> Result<Option<String>, UploadError> {
    let requested = match target {
        CollectionTarget::Root => return Ok(None),
        CollectionTarget::Existing(name) | CollectionTarget::New(name) => name,
    };
    let name = sanitize_input(requested);
    if name == ROOT_COLLECTION {
        return Ok(None);
    }
    if name.is_empty() || is_forbidden_name(&name) {
        return Err(UploadError::InvalidCollection(requested.clone()));
    }
    Ok(Some(name))
}

/// Sanitized file name for an upload called `original_name`.
fn target_file_name(original_name: &str) -> Result<String, UploadError> {
    let path = Path::new(original_name);
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .filter(|_| is_image_name(original_name))
        .ok_or_else(|| UploadError::UnsupportedType(original_name.to_string()))?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut base = sanitize_input(&stem);
    if base.is_empty() {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        base = format!("image_{millis}");
    }
    Ok(format!("{base}.{extension}"))
}

/// Copy `source` into the catalog's tree and generate its thumbnail.
///
/// The copy lands under a hidden temporary name first and is renamed into
/// place, so a scan never sees a half-written image.
pub fn import<B: ImageBackend>(
    catalog: &Catalog<B>,
    source: &Path,
    original_name: &str,
    target: &CollectionTarget,
) -> Result<UploadOutcome, UploadError> {
    let file_name = target_file_name(original_name)?;
    let collection = resolve_collection(target)?;

    let config = catalog.config();
    let size = std::fs::metadata(source)?.len();
    if size > config.uploads.max_file_size {
        return Err(UploadError::TooLarge {
            size,
            limit: config.uploads.max_file_size,
        });
    }

    let target_dir = match &collection {
        Some(name) => config.root.join(name),
        None => config.root.clone(),
    };
    std::fs::create_dir_all(&target_dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".upload-")
        .tempfile_in(&target_dir)?;
    io::copy(&mut std::fs::File::open(source)?, temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    let destination = target_dir.join(&file_name);
    temp.persist(&destination).map_err(|e| e.error)?;

    let relative_path = match &collection {
        Some(name) => format!("{name}/{file_name}"),
        None => file_name.clone(),
    };
    let collection = collection.unwrap_or_else(|| ROOT_COLLECTION.to_string());
    info!(%relative_path, size, "upload stored");

    if let Err(error) = catalog.ensure_thumbnail(&relative_path, &destination) {
        warn!(%relative_path, %error, "thumbnail failed for upload");
        return Err(UploadError::Thumbnail {
            relative_path,
            source: error,
        });
    }

    Ok(UploadOutcome {
        file_name,
        collection,
        relative_path,
    })
}
