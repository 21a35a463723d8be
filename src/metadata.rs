//! Image title and author resolution.
//!
//! Each field is resolved by walking an ordered chain of extractors over the
//! embedded [`ImageMetadata`]; the first non-empty value wins.
//!
//! ```text
//! title:  parameters → UserComment → ImageDescription → title tag → file stem
//! author: Artist → author tag → creator tag → "Unknown"
//! ```
//!
//! Titles are reduced to their first line: generation tools store the whole
//! prompt plus sampler settings in `parameters`, and only the prompt's first
//! line is useful as a caption.
//!
//! Metadata is best effort. A file whose tags cannot be read resolves exactly
//! like a file with no tags, so [`extract`] has no error case.

use crate::imaging::{ImageBackend, ImageMetadata};
use std::path::Path;
use tracing::debug;

/// Author given to images that name none.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// A metadata field lookup; `None` means "try the next source".
pub type Extractor = fn(&ImageMetadata) -> Option<&str>;

pub const TITLE_CHAIN: &[Extractor] = &[parameters, user_comment, image_description, title_tag];

pub const AUTHOR_CHAIN: &[Extractor] = &[artist, author_tag, creator_tag];

fn parameters(m: &ImageMetadata) -> Option<&str> {
    m.parameters.as_deref()
}

fn user_comment(m: &ImageMetadata) -> Option<&str> {
    m.user_comment.as_deref()
}

fn image_description(m: &ImageMetadata) -> Option<&str> {
    m.image_description.as_deref()
}

fn title_tag(m: &ImageMetadata) -> Option<&str> {
    m.title.as_deref()
}

fn artist(m: &ImageMetadata) -> Option<&str> {
    m.artist.as_deref()
}

fn author_tag(m: &ImageMetadata) -> Option<&str> {
    m.author.as_deref()
}

fn creator_tag(m: &ImageMetadata) -> Option<&str> {
    m.creator.as_deref()
}

/// Resolved display fields for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDetails {
    pub title: String,
    pub author: String,
}

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Run `chain` over `meta` and resolve the first usable value.
pub fn resolve_chain(chain: &[Extractor], meta: &ImageMetadata) -> Option<String> {
    let sources: Vec<Option<&str>> = chain.iter().map(|extract| extract(meta)).collect();
    resolve(&sources)
}

/// First line of `text`, trimmed.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// Resolve the title and author of the image at `path`.
///
/// `fallback_title` is used when no tag yields a title, normally the file
/// name without its extension.
pub fn extract(backend: &impl ImageBackend, path: &Path, fallback_title: &str) -> ImageDetails {
    let meta = backend.read_metadata(path).unwrap_or_else(|error| {
        debug!(path = %path.display(), %error, "no readable metadata");
        ImageMetadata::default()
    });
    details_from(&meta, fallback_title)
}

/// Apply both chains to already-read metadata.
pub fn details_from(meta: &ImageMetadata, fallback_title: &str) -> ImageDetails {
    let title = resolve_chain(TITLE_CHAIN, meta)
        .map(|t| first_line(&t).to_string())
        .unwrap_or_else(|| fallback_title.to_string());
    let author = resolve_chain(AUTHOR_CHAIN, meta).unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    ImageDetails { title, author }
}
