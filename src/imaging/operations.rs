//! High-level image operations.
//!
//! These functions combine configuration with backend execution: they compute
//! parameters and hand them to an [`ImageBackend`].

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 300,
            quality: Quality::new(85),
        }
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(source: &Path, output: &Path, config: &ThumbnailConfig) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width: config.width,
        quality: config.quality,
    }
}

/// Render a thumbnail of `source` into `output`.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &ThumbnailConfig,
) -> Result<()> {
    let params = plan_thumbnail(source, output, config);
    backend.thumbnail(&params)
}
