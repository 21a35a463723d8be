//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations every backend must
//! support: read embedded metadata, and render a width-bounded thumbnail.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and statically
//! linked. Tests swap in a recording mock so cache and catalog logic can be
//! checked without decoding pixels.

use super::params::ThumbnailParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Descriptive text embedded in an image, one slot per tag the catalog's
/// fallback chains consult.
///
/// Field mapping (production backend):
/// - `parameters`: PNG `parameters` text chunk (generation settings)
/// - `user_comment`: EXIF UserComment, else PNG `Comment`
/// - `image_description`: EXIF ImageDescription, else PNG `Description`
/// - `title`: PNG `Title`, else XMP `dc:title`, else IPTC ObjectName (`2:05`)
/// - `artist`: EXIF Artist
/// - `author`: PNG `Author`
/// - `creator`: XMP `dc:creator`, else IPTC By-line (`2:80`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub parameters: Option<String>,
    pub user_comment: Option<String>,
    pub image_description: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across the rayon worker pool.
pub trait ImageBackend: Sync {
    /// Read embedded EXIF/PNG/IPTC/XMP text.
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError>;

    /// Decode `params.source`, scale it to `params.width`, and write the result
    /// to `params.output` in the format implied by its extension.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
