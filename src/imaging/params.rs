//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between [`operations`](super::operations) (which decides what to
//! render and where) and the [`backend`](super::backend) (which does the pixel
//! work), so a mock backend can stand in during tests.
//!
//! - [`Quality`]: lossy encoding quality (1-100), clamped on construction.
//! - [`ThumbnailParams`]: source, output path, target width, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
///
/// Only JPEG output is lossy; the other formats ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Parameters for a width-bounded thumbnail render.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Where to write. The extension selects the output format.
    pub output: PathBuf,
    /// Output width; the height follows the source aspect ratio.
    pub width: u32,
    pub quality: Quality,
}
