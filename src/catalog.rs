//! Catalog assembly.
//!
//! A scan walks the root, and for every image makes sure its thumbnail exists,
//! resolves its title and author, and emits one [`ImageRecord`]:
//!
//! ```text
//! walk ──► image entries ──► (worker pool) ensure thumbnail ─┬─► extract metadata ─► record
//!                                                             └─► skipped (logged)
//! ```
//!
//! Per-image failures are values ([`ItemOutcome`]), partitioned into records
//! and skips after the parallel pass; a broken file never aborts the scan. The
//! only scan-level error is a root that cannot be opened.
//!
//! Nothing is stored between scans. Each call re-walks the tree, so the
//! catalog always reflects what is on disk; the thumbnails are the only
//! durable state.
//!
//! ## Collections
//!
//! The first path segment under the root names an image's collection;
//! images directly under the root belong to [`ROOT_COLLECTION`]. Deeper
//! subdirectories roll up into their top-level ancestor:
//!
//! ```text
//! outputs/catA/img1.jpg        → catA
//! outputs/catA/sub/img3.png    → catA
//! outputs/img2.png             → root
//! ```

use crate::cache::{CacheStats, CacheStatus, ThumbnailCache, ThumbnailError};
use crate::config::{self, ConfigError, GalleryConfig, ROOT_COLLECTION};
use crate::imaging::{ImageBackend, RustBackend};
use crate::metadata;
use crate::walk::{self, EntryKind, WalkEntry, WalkError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot open root {}: {source}", path.display())]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl From<WalkError> for ScanError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::RootUnavailable { path, source } => Self::RootUnavailable { path, source },
        }
    }
}

/// One image as served to clients.
///
/// Serialized with camelCase keys: `url`, `thumbnailUrl`, `title`, `author`,
/// `fileName`, `collection`, `relativePath`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub url: String,
    pub thumbnail_url: String,
    pub title: String,
    pub author: String,
    pub file_name: String,
    pub collection: String,
    /// `/`-separated, relative to the root. Unique within a scan.
    pub relative_path: String,
}

/// An image left out of the catalog because its thumbnail could not be made.
#[derive(Debug)]
pub struct SkippedImage {
    pub relative_path: String,
    pub error: ThumbnailError,
}

/// Result of processing one image.
pub type ItemOutcome = Result<(ImageRecord, CacheStatus), SkippedImage>;

/// Everything one scan produced.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<ImageRecord>,
    pub skipped: Vec<SkippedImage>,
    pub stats: CacheStats,
}

impl ScanReport {
    /// Partition per-image outcomes, keeping their order.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = ItemOutcome>) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            match outcome {
                Ok((record, status)) => {
                    report.stats.record(status);
                    report.records.push(record);
                }
                Err(skipped) => {
                    report.stats.fail();
                    report.skipped.push(skipped);
                }
            }
        }
        report
    }
}

/// The collection an image belongs to, from its relative path.
pub fn collection_of(relative_path: &str) -> &str {
    match relative_path.split_once('/') {
        Some((first, _)) => first,
        None => ROOT_COLLECTION,
    }
}

/// Indexes one root tree and owns its thumbnail cache and worker pool.
pub struct Catalog<B: ImageBackend = RustBackend> {
    config: GalleryConfig,
    cache: ThumbnailCache<B>,
    pool: rayon::ThreadPool,
}

impl Catalog<RustBackend> {
    pub fn new(config: GalleryConfig) -> Result<Self, ScanError> {
        Self::with_backend(config, RustBackend::new())
    }
}

impl<B: ImageBackend> Catalog<B> {
    /// Catalog rendering and reading metadata through `backend`.
    pub fn with_backend(config: GalleryConfig, backend: B) -> Result<Self, ScanError> {
        config.validate()?;
        let threads = config::effective_threads(&config.processing);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("gallery-worker-{i}"))
            .build()?;
        let cache = ThumbnailCache::with_backend(&config, backend);
        debug!(threads, cache_root = %cache.cache_root().display(), "catalog ready");
        Ok(Self {
            config,
            cache,
            pool,
        })
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn cache(&self) -> &ThumbnailCache<B> {
        &self.cache
    }

    /// Walk the root and build a record for every usable image.
    pub fn scan(&self) -> Result<ScanReport, ScanError> {
        let root = &self.config.root;
        let images: Vec<WalkEntry> = walk::walk(root, self.cache.cache_root())?
            .filter(|entry| entry.kind == EntryKind::Image)
            .collect();
        debug!(root = %root.display(), images = images.len(), "walk complete");

        let outcomes: Vec<ItemOutcome> = self
            .pool
            .install(|| images.par_iter().map(|entry| self.process_image(entry)).collect());
        let report = ScanReport::from_outcomes(outcomes);

        info!(
            root = %root.display(),
            records = report.records.len(),
            skipped = report.skipped.len(),
            cache = %report.stats,
            "scan complete"
        );
        Ok(report)
    }

    /// The records of a fresh scan, in traversal order.
    pub fn list_catalog(&self) -> Result<Vec<ImageRecord>, ScanError> {
        Ok(self.scan()?.records)
    }

    /// Sorted names of the first-level subdirectories of the root.
    ///
    /// Hidden directories, the cache and a directory named like the root
    /// sentinel are not listed. Empty directories are.
    pub fn list_collections(&self) -> Result<Vec<String>, ScanError> {
        let names = walk::walk_top_level(&self.config.root, self.cache.cache_root())?
            .filter(|entry| entry.kind == EntryKind::Directory)
            .map(|entry| entry.relative_path)
            .filter(|name| name != ROOT_COLLECTION)
            .collect();
        Ok(names)
    }

    /// Make sure the thumbnail for `relative_path` exists.
    pub fn ensure_thumbnail(
        &self,
        relative_path: &str,
        source: &Path,
    ) -> Result<CacheStatus, ThumbnailError> {
        self.cache.ensure_thumbnail(relative_path, source)
    }

    fn process_image(&self, entry: &WalkEntry) -> ItemOutcome {
        let relative_path = entry.relative_path.as_str();
        let status = self
            .cache
            .ensure_thumbnail(relative_path, &entry.absolute_path)
            .map_err(|error| {
                warn!(relative_path, %error, "skipping image");
                SkippedImage {
                    relative_path: relative_path.to_string(),
                    error,
                }
            })?;

        let file_name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or(relative_path)
            .to_string();
        let stem = Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.clone());
        let details = metadata::extract(self.cache.backend(), &entry.absolute_path, &stem);

        let record = ImageRecord {
            url: self.config.urls.image_url(relative_path),
            thumbnail_url: self.config.urls.thumbnail_url(relative_path),
            title: details.title,
            author: details.author,
            file_name,
            collection: collection_of(relative_path).to_string(),
            relative_path: relative_path.to_string(),
        };
        Ok((record, status))
    }
}
