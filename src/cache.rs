//! Thumbnail cache.
//!
//! Thumbnails live in a tree that mirrors the indexed root: the preview for
//! `catA/img1.jpg` is `<cache root>/catA/img1.jpg`. The relative path is the
//! whole cache key; a file at the mirrored path means "valid", and nothing
//! here ever deletes one.
//!
//! # Generate on miss
//!
//! [`ThumbnailCache::ensure_thumbnail`] is a no-op when the mirrored file
//! exists. Otherwise it decodes the source, scales it to the configured width
//! (height follows the aspect ratio) and encodes it in the format the file
//! extension names.
//!
//! ## Writes
//!
//! The backend renders into a hidden temporary file next to the target
//! (`.tmp-XXXXXX.<ext>`), which is then renamed over the target. Readers
//! therefore see either no file or a complete one, and two callers racing on
//! the same path both succeed: the later rename simply replaces the earlier
//! file with identical content. A failed render drops the temporary file, so
//! errors never leave anything at the mirrored path.
//!
//! ## Staleness
//!
//! With `thumbnails.refresh_stale` set, an existing thumbnail older than its
//! source (by modification time) is regenerated. Off by default.

use crate::config::GalleryConfig;
use crate::imaging::{BackendError, ImageBackend, RustBackend, ThumbnailConfig};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("invalid relative path: {0:?}")]
    InvalidPath(String),
    #[error("cannot render thumbnail of {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: BackendError,
    },
    #[error("cannot write thumbnail {}: {source}", path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What `ensure_thumbnail` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// A thumbnail was already there; nothing was decoded or written.
    Cached,
    /// A thumbnail was rendered and moved into place.
    Generated,
}

/// Lazily-populated mirror of the root tree holding preview images.
pub struct ThumbnailCache<B: ImageBackend = RustBackend> {
    cache_root: PathBuf,
    config: ThumbnailConfig,
    refresh_stale: bool,
    backend: B,
}

impl ThumbnailCache<RustBackend> {
    pub fn new(config: &GalleryConfig) -> Self {
        Self::with_backend(config, RustBackend::new())
    }
}

impl<B: ImageBackend> ThumbnailCache<B> {
    /// Cache rendering through `backend` (tests use a mock).
    pub fn with_backend(config: &GalleryConfig, backend: B) -> Self {
        Self {
            cache_root: config.cache_root(),
            config: ThumbnailConfig {
                width: config.thumbnails.width,
                ..ThumbnailConfig::default()
            },
            refresh_stale: config.thumbnails.refresh_stale,
            backend,
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mirrored location of the thumbnail for `relative_path`.
    ///
    /// Absolute paths and paths that climb out with `..` are rejected so the
    /// cache never writes outside its root.
    pub fn thumbnail_path(&self, relative_path: &str) -> Result<PathBuf, ThumbnailError> {
        let relative = Path::new(relative_path);
        let mut has_name = false;
        for component in relative.components() {
            match component {
                Component::Normal(_) => has_name = true,
                Component::CurDir => {}
                _ => return Err(ThumbnailError::InvalidPath(relative_path.to_string())),
            }
        }
        if !has_name {
            return Err(ThumbnailError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.cache_root.join(relative))
    }

    /// Make sure a thumbnail for `source` exists at the mirrored path.
    pub fn ensure_thumbnail(
        &self,
        relative_path: &str,
        source: &Path,
    ) -> Result<CacheStatus, ThumbnailError> {
        let target = self.thumbnail_path(relative_path)?;
        if target.is_file() && !self.is_stale(source, &target) {
            return Ok(CacheStatus::Cached);
        }

        let parent = target
            .parent()
            .ok_or_else(|| ThumbnailError::InvalidPath(relative_path.to_string()))?;
        std::fs::create_dir_all(parent).map_err(|e| ThumbnailError::CacheWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;

        let extension = target
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix(".tmp-")
            .suffix(&extension)
            .tempfile_in(parent)
            .map_err(|e| ThumbnailError::CacheWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;

        crate::imaging::create_thumbnail(&self.backend, source, temp.path(), &self.config)
            .map_err(|e| ThumbnailError::Image {
                path: source.to_path_buf(),
                source: e,
            })?;

        temp.persist(&target)
            .map_err(|e| ThumbnailError::CacheWrite {
                path: target.clone(),
                source: e.error,
            })?;

        debug!(relative_path, path = %target.display(), "thumbnail generated");
        Ok(CacheStatus::Generated)
    }

    fn is_stale(&self, source: &Path, target: &Path) -> bool {
        if !self.refresh_stale {
            return false;
        }
        let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified()).ok();
        match (modified(source), modified(target)) {
            (Some(source), Some(target)) => source > target,
            _ => false,
        }
    }
}

/// Summary of cache activity for a scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached: u32,
    pub generated: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn record(&mut self, status: CacheStatus) {
        match status {
            CacheStatus::Cached => self.cached += 1,
            CacheStatus::Generated => self.generated += 1,
        }
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.cached + self.generated + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} cached, {} generated, {} failed ({} total)",
                self.cached,
                self.generated,
                self.failed,
                self.total()
            )
        } else {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.cached,
                self.generated,
                self.total()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::write_jpeg;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn mock_cache(root: &Path, backend: MockBackend) -> ThumbnailCache<MockBackend> {
        ThumbnailCache::with_backend(&GalleryConfig::for_root(root), backend)
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    // =========================================================================
    // Paths
    // =========================================================================

    #[test]
    fn thumbnail_path_mirrors_relative_path() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), MockBackend::new());
        assert_eq!(
            cache.thumbnail_path("catA/img1.jpg").unwrap(),
            tmp.path().join(".thumbnails").join("catA").join("img1.jpg")
        );
    }

    #[test]
    fn custom_cache_dir_is_used() {
        let tmp = TempDir::new().unwrap();
        let mut config = GalleryConfig::for_root(tmp.path().join("outputs"));
        config.cache_dir = Some(tmp.path().join("previews"));
        let cache = ThumbnailCache::with_backend(&config, MockBackend::new());
        assert_eq!(
            cache.thumbnail_path("a.png").unwrap(),
            tmp.path().join("previews").join("a.png")
        );
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), MockBackend::new());
        for bad in ["../x.jpg", "/etc/x.jpg", "", "a/../../b.jpg", "."] {
            assert!(
                matches!(cache.thumbnail_path(bad), Err(ThumbnailError::InvalidPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    // =========================================================================
    // ensure_thumbnail
    // =========================================================================

    #[test]
    fn generates_on_miss_then_hits() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let cache = mock_cache(tmp.path(), backend);
        let source = tmp.path().join("catA/img1.jpg");

        let first = cache.ensure_thumbnail("catA/img1.jpg", &source).unwrap();
        assert_eq!(first, CacheStatus::Generated);
        let target = tmp.path().join(".thumbnails/catA/img1.jpg");
        assert_eq!(fs::read(&target).unwrap(), b"mock thumbnail");
        assert_eq!(cache.backend().thumbnail_count(), 1);

        let second = cache.ensure_thumbnail("catA/img1.jpg", &source).unwrap();
        assert_eq!(second, CacheStatus::Cached);
        assert_eq!(cache.backend().get_operations().len(), 1);
    }

    #[test]
    fn renders_into_hidden_temp_sibling() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), MockBackend::new());
        cache
            .ensure_thumbnail("img2.png", &tmp.path().join("img2.png"))
            .unwrap();

        let ops = cache.backend().get_operations();
        let RecordedOp::Thumbnail { output, width, .. } = &ops[0] else {
            panic!("expected a thumbnail op, got {ops:?}");
        };
        let output = Path::new(output);
        assert_eq!(*width, 300);
        assert_eq!(output.parent().unwrap(), tmp.path().join(".thumbnails"));
        let name = output.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".tmp-") && name.ends_with(".png"), "{name}");
    }

    #[test]
    fn configured_width_reaches_backend() {
        let tmp = TempDir::new().unwrap();
        let mut config = GalleryConfig::for_root(tmp.path());
        config.thumbnails.width = 120;
        let cache = ThumbnailCache::with_backend(&config, MockBackend::new());
        cache
            .ensure_thumbnail("a.jpg", &tmp.path().join("a.jpg"))
            .unwrap();
        assert!(matches!(
            &cache.backend().get_operations()[0],
            RecordedOp::Thumbnail { width: 120, .. }
        ));
    }

    #[test]
    fn decode_failure_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), MockBackend::new().fail_decode("bad.jpg"));

        let result = cache.ensure_thumbnail("catA/bad.jpg", &tmp.path().join("catA/bad.jpg"));

        assert!(matches!(
            result,
            Err(ThumbnailError::Image {
                source: BackendError::Decode(_),
                ..
            })
        ));
        let dir = tmp.path().join(".thumbnails/catA");
        assert!(!dir.join("bad.jpg").exists());
        assert!(dir_names(&dir).is_empty());
    }

    #[test]
    fn failure_is_retried_on_next_call() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), MockBackend::new().fail_decode("bad.jpg"));
        let source = tmp.path().join("bad.jpg");

        assert!(cache.ensure_thumbnail("bad.jpg", &source).is_err());
        assert!(cache.ensure_thumbnail("bad.jpg", &source).is_err());
        assert_eq!(cache.backend().thumbnail_count(), 2);
    }

    #[test]
    fn existing_file_is_trusted_without_refresh() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), MockBackend::new());
        let target = tmp.path().join(".thumbnails/old.jpg");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"whatever was there").unwrap();
        fs::File::options()
            .write(true)
            .open(&target)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();
        let source = tmp.path().join("old.jpg");
        fs::write(&source, b"newer source").unwrap();

        assert_eq!(
            cache.ensure_thumbnail("old.jpg", &source).unwrap(),
            CacheStatus::Cached
        );
        assert_eq!(fs::read(&target).unwrap(), b"whatever was there");
    }

    #[test]
    fn refresh_stale_regenerates_older_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let mut config = GalleryConfig::for_root(tmp.path());
        config.thumbnails.refresh_stale = true;
        let cache = ThumbnailCache::with_backend(&config, MockBackend::new());

        let target = tmp.path().join(".thumbnails/old.jpg");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"stale").unwrap();
        fs::File::options()
            .write(true)
            .open(&target)
            .unwrap()
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
            .unwrap();
        let source = tmp.path().join("old.jpg");
        fs::write(&source, b"newer source").unwrap();

        assert_eq!(
            cache.ensure_thumbnail("old.jpg", &source).unwrap(),
            CacheStatus::Generated
        );
        assert_eq!(fs::read(&target).unwrap(), b"mock thumbnail");

        // Now newer than the source.
        assert_eq!(
            cache.ensure_thumbnail("old.jpg", &source).unwrap(),
            CacheStatus::Cached
        );
    }

    #[test]
    fn concurrent_ensure_leaves_one_valid_file() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("catA/img1.jpg");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        write_jpeg(&source, 600, 400);
        let cache = ThumbnailCache::new(&GalleryConfig::for_root(tmp.path()));
        let barrier = std::sync::Barrier::new(2);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        cache.ensure_thumbnail("catA/img1.jpg", &source)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for result in &results {
            assert!(result.is_ok(), "{result:?}");
        }
        let dir = tmp.path().join(".thumbnails/catA");
        assert_eq!(dir_names(&dir), vec!["img1.jpg"]);
        assert_eq!(
            image::image_dimensions(dir.join("img1.jpg")).unwrap(),
            (300, 200)
        );
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    #[test]
    fn stats_record_outcomes() {
        let mut stats = CacheStats::default();
        stats.record(CacheStatus::Cached);
        stats.record(CacheStatus::Generated);
        stats.record(CacheStatus::Generated);
        stats.fail();
        assert_eq!(
            stats,
            CacheStats {
                cached: 1,
                generated: 2,
                failed: 1
            }
        );
        assert_eq!(stats.total(), 4);
    }

    #[test]
    fn stats_display() {
        let clean = CacheStats {
            cached: 3,
            generated: 1,
            failed: 0,
        };
        assert_eq!(clean.to_string(), "3 cached, 1 generated (4 total)");

        let with_failures = CacheStats {
            cached: 1,
            generated: 2,
            failed: 1,
        };
        assert_eq!(
            with_failures.to_string(),
            "1 cached, 2 generated, 1 failed (4 total)"
        );
    }
}
