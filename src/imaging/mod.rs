//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Metadata** | `kamadak-exif` + custom PNG text, IPTC and XMP readers |
//! | **Thumbnail** | `resize_exact` (Lanczos3) to a fixed width, aspect preserved |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend
//! - **Tag readers**: one small parser per embedded metadata format

pub mod backend;
mod calculations;
pub(crate) mod exif_reader;
pub(crate) mod iptc_parser;
pub mod operations;
mod params;
pub(crate) mod png_text;
pub mod rust_backend;
pub(crate) mod xmp_parser;

pub use backend::{BackendError, ImageBackend, ImageMetadata};
pub use calculations::{MAX_THUMBNAIL_HEIGHT, calculate_scaled_dimensions, within_output_bounds};
pub use operations::{ThumbnailConfig, create_thumbnail, plan_thumbnail};
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::RustBackend;
