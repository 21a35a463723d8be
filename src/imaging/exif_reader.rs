//! EXIF text tags via `kamadak-exif`.
//!
//! Reads the three EXIF fields the catalog uses: `Artist`,
//! `ImageDescription` and `UserComment`. The container (JPEG, TIFF, PNG
//! `eXIf`, WebP, HEIF) is detected by the exif crate.

use std::io::Cursor;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExifText {
    pub artist: Option<String>,
    pub image_description: Option<String>,
    pub user_comment: Option<String>,
}

/// Extract EXIF text fields from raw file bytes.
///
/// Files without EXIF, and EXIF blocks too damaged to yield a partial
/// result, produce an empty [`ExifText`].
pub fn read_exif(data: &[u8]) -> ExifText {
    let mut reader = exif::Reader::new();
    reader.continue_on_error(true);

    let exif = match reader
        .read_from_container(&mut Cursor::new(data))
        .or_else(|e| {
            e.distill_partial_result(|errors| {
                for error in errors {
                    tracing::debug!(%error, "skipping malformed EXIF field");
                }
            })
        }) {
        Ok(exif) => exif,
        Err(_) => return ExifText::default(),
    };

    let user_comment = exif
        .get_field(exif::Tag::UserComment, exif::In::PRIMARY)
        .and_then(|field| match &field.value {
            exif::Value::Undefined(raw, _) => decode_user_comment(raw, exif.little_endian()),
            other => ascii_value(other),
        });

    ExifText {
        artist: ascii_field(&exif, exif::Tag::Artist),
        image_description: ascii_field(&exif, exif::Tag::ImageDescription),
        user_comment,
    }
}

fn ascii_field(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    exif.get_field(tag, exif::In::PRIMARY)
        .and_then(|field| ascii_value(&field.value))
}

/// ASCII values may hold several NUL-separated strings; join them.
///
/// Many writers put UTF-8 in ASCII fields, so bytes are decoded as UTF-8.
fn ascii_value(value: &exif::Value) -> Option<String> {
    let exif::Value::Ascii(parts) = value else {
        return None;
    };
    let text = parts
        .iter()
        .map(|p| String::from_utf8_lossy(p).trim_matches('\0').trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(text)
}

const ASCII_CODE: &[u8; 8] = b"ASCII\0\0\0";
const UNICODE_CODE: &[u8; 8] = b"UNICODE\0";

/// Decode a UserComment: an 8-byte character code followed by the text.
///
/// `UNICODE` text is UTF-16 in the byte order of the EXIF block unless it
/// carries a BOM. `ASCII`, `JIS` and undefined (all zero) codes are decoded
/// as lossy UTF-8.
fn decode_user_comment(raw: &[u8], little_endian: bool) -> Option<String> {
    if raw.len() < 8 {
        return non_empty(String::from_utf8_lossy(raw).to_string());
    }
    let (code, body) = raw.split_at(8);
    let text = if code == UNICODE_CODE {
        decode_utf16(body, little_endian)
    } else if code == ASCII_CODE || code.starts_with(b"JIS") || code.iter().all(|&b| b == 0) {
        String::from_utf8_lossy(body).to_string()
    } else {
        String::from_utf8_lossy(raw).to_string()
    };
    non_empty(text)
}

fn decode_utf16(body: &[u8], little_endian: bool) -> String {
    let (body, little_endian) = match body {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => (body, little_endian),
    };
    let units = body.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
