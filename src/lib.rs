//! # Gallery Index
//!
//! Indexes a directory tree of generated images into a flat catalog and keeps
//! a mirror tree of thumbnails next to it. The filesystem is the data source:
//! first-level directories are collections, images directly under the root
//! belong to the `root` collection, and nothing is stored anywhere else.
//!
//! # Architecture
//!
//! ```text
//! walk      root/          →  WalkEntry stream   (sorted, pruned, errors skipped)
//! cache     WalkEntry      →  .thumbnails/...    (generate on miss, atomic rename)
//! metadata  image bytes    →  title + author     (ordered fallback chains)
//! catalog   all of the above, fanned out over a worker pool → ImageRecord list
//! ```
//!
//! Each scan recomputes the catalog from scratch. The only persistent state is
//! the thumbnail tree, and it is safe to delete at any time.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`walk`] | Deterministic traversal of the root, skipping hidden entries and the cache |
//! | [`cache`] | Thumbnail path mapping, generate-on-miss, cache statistics |
//! | [`metadata`] | Title and author resolution from EXIF, PNG text chunks, IPTC and XMP |
//! | [`catalog`] | Parallel scan producing `ImageRecord`s, collection listing |
//! | [`upload`] | Placing a new image into a collection with sanitized names |
//! | [`config`] | `config.toml` loading, stock defaults, validation |
//! | [`imaging`] | Pure-Rust decode, resize and metadata readers behind `ImageBackend` |
//! | [`output`] | CLI text formatting |
//!
//! # Design Decisions
//!
//! ## Thumbnails Keep the Source Format
//!
//! A thumbnail lives at the same relative path as its source, extension
//! included, under the cache root. Serving them needs no lookup table: the
//! `/thumbnails/<rel>` address maps to one file.
//!
//! ## Concurrent Generation Is Allowed
//!
//! Two requests for the same missing thumbnail may both render it. Each writes
//! to its own temporary file and renames it into place, so readers only ever
//! see a complete file and the last writer wins with identical bytes.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding and resizing use the `image` crate (Lanczos3), EXIF comes from
//! `kamadak-exif`, and PNG/IPTC/XMP text is parsed by small readers in
//! [`imaging`]. No system libraries are needed.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod imaging;
pub mod metadata;
pub mod output;
pub mod upload;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
