//! Shared test utilities for the gallery-index test suite.
//!
//! Fixtures are generated in-process rather than checked in: small gradient
//! images encoded with the `image` crate, optionally carrying EXIF (built
//! with kamadak-exif's writer) or PNG `tEXt` chunks. Segments and chunks are
//! spliced in with `img_parts`.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! write_jpeg(&tmp.path().join("catA/img1.jpg"), 600, 400);
//! std::fs::write(
//!     tmp.path().join("gen.png"),
//!     png_with_text(64, 64, &[("parameters", "a red fox")]),
//! ).unwrap();
//! ```

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage};
use img_parts::jpeg::Jpeg;
use img_parts::png::{Png, PngChunk};
use img_parts::{Bytes, ImageEXIF};

// =========================================================================
// Plain images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 90)
        .encode_image(&gradient(width, height))
        .unwrap();
    buf
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gradient(width, height))
        .write_to(&mut cursor, ImageFormat::Png)
        .unwrap();
    cursor.into_inner()
}

/// Write a JPEG of the given size, creating parent directories.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    write_bytes(path, &jpeg_bytes(width, height));
}

/// Write a PNG of the given size, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    write_bytes(path, &png_bytes(width, height));
}

fn write_bytes(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

// =========================================================================
// EXIF
// =========================================================================

/// Serialize fields into a big-endian TIFF block.
pub fn exif_tiff_bytes(fields: &[exif::Field]) -> Vec<u8> {
    let mut writer = exif::experimental::Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut cursor = Cursor::new(Vec::new());
    writer.write(&mut cursor, false).unwrap();
    cursor.into_inner()
}

/// A JPEG carrying `fields` in its Exif segment.
pub fn jpeg_with_exif(width: u32, height: u32, fields: &[exif::Field]) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(jpeg_bytes(width, height).into()).unwrap();
    jpeg.set_exif(Some(exif_tiff_bytes(fields).into()));
    let mut out = Vec::new();
    jpeg.encoder().write_to(&mut out).unwrap();
    out
}

// =========================================================================
// PNG text chunks
// =========================================================================

/// A PNG with one `tEXt` chunk per `(keyword, text)` pair, placed after IHDR.
pub fn png_with_text(width: u32, height: u32, entries: &[(&str, &str)]) -> Vec<u8> {
    let mut png = Png::from_bytes(png_bytes(width, height).into()).unwrap();
    for (offset, (keyword, text)) in entries.iter().enumerate() {
        let mut data = keyword.as_bytes().to_vec();
        data.push(0);
        data.extend_from_slice(text.as_bytes());
        png.chunks_mut()
            .insert(1 + offset, PngChunk::new(*b"tEXt", Bytes::from(data)));
    }
    let mut out = Vec::new();
    png.encoder().write_to(&mut out).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_helper_keeps_ihdr_first() {
        let data = png_with_text(4, 4, &[("Title", "t"), ("Author", "a")]);
        let png = Png::from_bytes(data.into()).unwrap();
        let kinds: Vec<[u8; 4]> = png.chunks().iter().take(3).map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![*b"IHDR", *b"tEXt", *b"tEXt"]);
    }

    #[test]
    fn jpeg_helper_round_trips_exif_segment() {
        let artist = exif::Field {
            tag: exif::Tag::Artist,
            ifd_num: exif::In::PRIMARY,
            value: exif::Value::Ascii(vec![b"Ann".to_vec()]),
        };
        let data = jpeg_with_exif(8, 8, &[artist]);
        let jpeg = Jpeg::from_bytes(data.into()).unwrap();
        assert!(jpeg.exif().is_some());
    }
}
