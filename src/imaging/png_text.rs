//! PNG textual chunk reader.
//!
//! Image generators and editors store their descriptive text in PNG text
//! chunks rather than EXIF: Stable Diffusion front-ends write the prompt and
//! sampler settings to a `parameters` chunk, and the PNG standard defines
//! `Title`, `Author`, `Description` and `Comment` keywords.
//!
//! Supported chunks:
//! - `tEXt`: Latin-1 keyword and text
//! - `iTXt`: UTF-8 text, uncompressed only
//!
//! `zTXt` and compressed `iTXt` are skipped. Container parsing is done by
//! `img_parts`; data it rejects as a PNG yields no text.

use img_parts::Bytes;
use img_parts::png::Png;

/// Keyword/text pairs in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PngText {
    entries: Vec<(String, String)>,
}

impl PngText {
    /// First non-empty text for `keyword`, compared case-insensitively.
    pub fn get(&self, keyword: &str) -> Option<String> {
        self.entries
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(keyword))
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
            .map(String::from)
    }
}

/// Read all text chunks from raw PNG bytes.
/// Non-PNG data yields an empty result.
pub fn read_png_text(data: &[u8]) -> PngText {
    let mut text = PngText::default();
    let Ok(png) = Png::from_bytes(Bytes::copy_from_slice(data)) else {
        return text;
    };

    for chunk in png.chunks() {
        let entry = match &chunk.kind() {
            b"tEXt" => parse_text_chunk(chunk.contents()),
            b"iTXt" => parse_itxt_chunk(chunk.contents()),
            _ => None,
        };
        text.entries.extend(entry);
    }
    text
}

/// `tEXt`: keyword, NUL, text. Both Latin-1.
fn parse_text_chunk(body: &[u8]) -> Option<(String, String)> {
    let nul = body.iter().position(|&b| b == 0)?;
    let keyword = latin1(&body[..nul]);
    let value = latin1(&body[nul + 1..]);
    Some((keyword, value))
}

/// `iTXt`: keyword, NUL, compression flag, compression method,
/// language tag, NUL, translated keyword, NUL, UTF-8 text.
fn parse_itxt_chunk(body: &[u8]) -> Option<(String, String)> {
    let nul = body.iter().position(|&b| b == 0)?;
    let keyword = latin1(&body[..nul]);
    let rest = body.get(nul + 1..)?;
    let (&compressed, rest) = rest.split_first()?;
    if compressed != 0 {
        return None;
    }
    let rest = rest.get(1..)?; // compression method
    let lang_end = rest.iter().position(|&b| b == 0)?;
    let rest = &rest[lang_end + 1..];
    let translated_end = rest.iter().position(|&b| b == 0)?;
    let value = String::from_utf8_lossy(&rest[translated_end + 1..]).to_string();
    Some((keyword, value))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
