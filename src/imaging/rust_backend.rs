//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, WebP, BMP, TIFF) | `image` crate, format sniffed from content |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode | `image` encoder chosen by output extension, JPEG at the configured quality |
//! | EXIF metadata | `kamadak-exif` via [`exif_reader`](super::exif_reader) |
//! | PNG text | `img_parts` chunks, decoded by [`png_text`](super::png_text) |
//! | IPTC metadata | custom [`iptc_parser`](super::iptc_parser) (JPEG APP13 + TIFF IFD) |
//! | XMP metadata | custom [`xmp_parser`](super::xmp_parser) packet scan |

use super::backend::{BackendError, ImageBackend, ImageMetadata};
use super::calculations::{MAX_THUMBNAIL_HEIGHT, calculate_scaled_dimensions, within_output_bounds};
use super::exif_reader::read_exif;
use super::iptc_parser::read_iptc;
use super::params::ThumbnailParams;
use super::png_text::read_png_text;
use super::xmp_parser::read_xmp;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Load and decode an image from disk.
///
/// The format is guessed from the file's leading bytes, so a PNG saved with
/// a `.jpg` extension still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::Decode(format!("{}: {}", path.display(), e)))
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        BackendError::Encode(format!("unsupported output {}: {}", path.display(), e))
    })?;
    let mut writer = BufWriter::new(File::create(path)?);

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100) as u8);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        // JPEG has no alpha; everything else keeps it.
        other => DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut writer, other),
    }
    .map_err(|e| BackendError::Encode(format!("{}: {}", path.display(), e)))?;

    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}

/// Merge every metadata source found in `data` into one [`ImageMetadata`].
///
/// Each parser ignores containers it does not understand, so all of them
/// run on every file.
pub(crate) fn collect_metadata(data: &[u8]) -> ImageMetadata {
    let exif = read_exif(data);
    let png = read_png_text(data);
    let xmp = read_xmp(data);
    let iptc = read_iptc(data);

    ImageMetadata {
        parameters: png.get("parameters"),
        user_comment: exif.user_comment.or_else(|| png.get("Comment")),
        image_description: exif.image_description.or_else(|| png.get("Description")),
        title: png.get("Title").or(xmp.title).or(iptc.object_name),
        artist: exif.artist,
        author: png.get("Author"),
        creator: xmp.creator.or(iptc.byline),
    }
}

impl ImageBackend for RustBackend {
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata, BackendError> {
        let data = std::fs::read(path)?;
        Ok(collect_metadata(&data))
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let (width, height) = calculate_scaled_dimensions((img.width(), img.height()), params.width);
        if !within_output_bounds((width, height)) {
            return Err(BackendError::Encode(format!(
                "{}: thumbnail would be {width}x{height}, taller than {MAX_THUMBNAIL_HEIGHT}px",
                params.source.display()
            )));
        }
        let resized = img.resize_exact(width, height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }
}
