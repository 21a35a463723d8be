//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. User values are
//! layered on top of stock defaults, so a config file only needs the keys it
//! wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! root = "outputs"              # Tree of collections to index
//! # cache_dir = "outputs/.thumbnails"  # Thumbnail cache (default: <root>/.thumbnails)
//!
//! [thumbnails]
//! width = 300                   # Thumbnail width in pixels, height follows aspect
//! refresh_stale = false         # Regenerate when the source is newer than its thumbnail
//!
//! [urls]
//! images = "/images"            # Mount prefix for originals
//! thumbnails = "/thumbnails"    # Mount prefix for thumbnails
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = half the cores)
//!
//! [uploads]
//! max_file_size = 20971520      # Largest accepted upload, in bytes
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reserved name of the thumbnail cache directory inside the root tree.
///
/// Never treated as a collection, wherever it appears.
pub const CACHE_DIR_NAME: &str = ".thumbnails";

/// Collection name given to images that sit directly under the root.
pub const ROOT_COLLECTION: &str = "root";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `config.toml`.
///
/// Threaded explicitly through the walker, cache and catalog; nothing reads
/// these paths from global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Root of the indexed tree. Each first-level subdirectory is a collection.
    pub root: PathBuf,
    /// Thumbnail cache root. When absent, `<root>/.thumbnails` is used.
    pub cache_dir: Option<PathBuf>,
    /// Thumbnail generation settings.
    pub thumbnails: ThumbnailsConfig,
    /// Address prefixes used to build record URLs.
    pub urls: UrlsConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Upload placement limits.
    pub uploads: UploadsConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("outputs"),
            cache_dir: None,
            thumbnails: ThumbnailsConfig::default(),
            urls: UrlsConfig::default(),
            processing: ProcessingConfig::default(),
            uploads: UploadsConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Defaults rooted at `root`.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Effective thumbnail cache root.
    pub fn cache_root(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.root.join(CACHE_DIR_NAME))
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thumbnails.width == 0 || self.thumbnails.width > MAX_THUMBNAIL_WIDTH {
            return Err(ConfigError::Validation(format!(
                "thumbnails.width must be 1-{MAX_THUMBNAIL_WIDTH}"
            )));
        }
        if !self.urls.images.starts_with('/') || !self.urls.thumbnails.starts_with('/') {
            return Err(ConfigError::Validation(
                "urls prefixes must start with '/'".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.uploads.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "uploads.max_file_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

const MAX_THUMBNAIL_WIDTH: u32 = 10_000;

/// Thumbnail generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Output width in pixels. Height is scaled to keep the aspect ratio.
    pub width: u32,
    /// Regenerate a thumbnail whose source was modified after it was written.
    /// Off by default: the relative path alone is the cache key.
    pub refresh_stale: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            width: 300,
            refresh_stale: false,
        }
    }
}

/// Mount prefixes combined with a relative path to form record URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UrlsConfig {
    pub images: String,
    pub thumbnails: String,
}

impl Default for UrlsConfig {
    fn default() -> Self {
        Self {
            images: "/images".to_string(),
            thumbnails: "/thumbnails".to_string(),
        }
    }
}

impl UrlsConfig {
    /// Address of an original image.
    pub fn image_url(&self, relative_path: &str) -> String {
        join_url(&self.images, relative_path)
    }

    /// Address of a cached thumbnail.
    pub fn thumbnail_url(&self, relative_path: &str) -> String {
        join_url(&self.thumbnails, relative_path)
    }
}

fn join_url(prefix: &str, relative_path: &str) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), relative_path)
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel thumbnail workers.
    /// When absent, defaults to half the CPU cores (at least one).
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → half the available cores, at least 1 (decode is CPU-bound and
///   the host keeps serving requests)
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.min(cores))
        .unwrap_or(cores / 2)
        .max(1)
}

/// Upload placement limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadsConfig {
    /// Largest accepted upload in bytes.
    pub max_file_size: u64,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 20 * 1024 * 1024,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(GalleryConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a `config.toml` path.
///
/// A missing file yields the stock defaults. Unknown keys and out-of-range
/// values are errors.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# gallery-index configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Tree of image collections to index. Each first-level subdirectory is a
# collection; images directly inside belong to the "root" collection.
root = "outputs"

# Thumbnail cache root, mirroring the layout of `root`.
# Defaults to <root>/.thumbnails, which the scanner always skips.
# cache_dir = "outputs/.thumbnails"

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Thumbnail width in pixels; height is scaled to keep the aspect ratio.
width = 300

# Thumbnails are keyed by relative path only. Set to true to regenerate a
# thumbnail when its source file was modified after the thumbnail was written.
refresh_stale = false

# ---------------------------------------------------------------------------
# URLs
# ---------------------------------------------------------------------------
[urls]
# Prefix for original images (record `url`).
images = "/images"

# Prefix for thumbnails (record `thumbnailUrl`).
thumbnails = "/thumbnails"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel thumbnail workers.
# Omit or comment out to auto-detect (= half the CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Uploads
# ---------------------------------------------------------------------------
[uploads]
# Largest accepted upload, in bytes (20 MiB).
max_file_size = 20971520
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GalleryConfig::default();
        assert_eq!(config.root, PathBuf::from("outputs"));
        assert_eq!(config.thumbnails.width, 300);
        assert!(!config.thumbnails.refresh_stale);
        assert_eq!(config.urls.images, "/images");
        assert_eq!(config.urls.thumbnails, "/thumbnails");
        assert_eq!(config.uploads.max_file_size, 20 * 1024 * 1024);
    }

    #[test]
    fn cache_root_defaults_under_root() {
        let config = GalleryConfig::for_root("/srv/outputs");
        assert_eq!(config.cache_root(), PathBuf::from("/srv/outputs/.thumbnails"));
    }

    #[test]
    fn cache_root_uses_explicit_dir() {
        let config = GalleryConfig {
            cache_dir: Some(PathBuf::from("/var/cache/thumbs")),
            ..GalleryConfig::for_root("/srv/outputs")
        };
        assert_eq!(config.cache_root(), PathBuf::from("/var/cache/thumbs"));
    }

    #[test]
    fn urls_join_prefix_and_relative_path() {
        let urls = UrlsConfig::default();
        assert_eq!(urls.image_url("catA/img1.jpg"), "/images/catA/img1.jpg");
        assert_eq!(urls.thumbnail_url("img2.png"), "/thumbnails/img2.png");
    }

    #[test]
    fn urls_tolerate_trailing_slash() {
        let urls = UrlsConfig {
            images: "/media/".into(),
            thumbnails: "/thumbs/".into(),
        };
        assert_eq!(urls.image_url("a.png"), "/media/a.png");
        assert_eq!(urls.thumbnail_url("a.png"), "/thumbs/a.png");
    }

    #[test]
    fn parse_partial_config() {
        let overlay: toml::Value = toml::from_str(
            r#"
            [thumbnails]
            width = 480
            "#,
        )
        .unwrap();
        let config = resolve_config(Some(overlay)).unwrap();
        assert_eq!(config.thumbnails.width, 480);
        assert!(!config.thumbnails.refresh_stale);
        assert_eq!(config.root, PathBuf::from("outputs"));
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.thumbnails.width, 300);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
root = "/data/gallery"
cache_dir = "/data/cache"

[urls]
images = "/originals"

[processing]
max_processes = 2
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/data/gallery"));
        assert_eq!(config.cache_root(), PathBuf::from("/data/cache"));
        assert_eq!(config.urls.images, "/originals");
        assert_eq!(config.urls.thumbnails, "/thumbnails");
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not [valid toml").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("colour = \"red\"").unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let overlay: toml::Value = toml::from_str(
            r#"
            [thumbnails]
            height = 200
            "#,
        )
        .unwrap();
        assert!(resolve_config(Some(overlay)).is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(GalleryConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_zero_width() {
        let mut config = GalleryConfig::default();
        config.thumbnails.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_url_prefix_must_be_absolute() {
        let mut config = GalleryConfig::default();
        config.urls.thumbnails = "thumbnails".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_processes() {
        let mut config = GalleryConfig::default();
        config.processing.max_processes = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_zero_upload_size() {
        let mut config = GalleryConfig::default();
        config.uploads.max_file_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn effective_threads_auto_is_at_least_one() {
        let threads = effective_threads(&ProcessingConfig::default());
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert!(threads >= 1);
        assert!(threads <= cores);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
            [thumbnails]
            width = 300
            refresh_stale = false
            "#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
            [thumbnails]
            refresh_stale = true
            "#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let thumbs = merged.get("thumbnails").unwrap();
        assert_eq!(thumbs.get("width").unwrap().as_integer(), Some(300));
        assert_eq!(thumbs.get("refresh_stale").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        let defaults = GalleryConfig::default();
        assert_eq!(config.root, defaults.root);
        assert_eq!(config.thumbnails.width, defaults.thumbnails.width);
        assert_eq!(config.urls.images, defaults.urls.images);
        assert_eq!(config.uploads.max_file_size, defaults.uploads.max_file_size);
    }

    #[test]
    fn stock_defaults_value_is_table() {
        let value = stock_defaults_value().unwrap();
        assert!(value.is_table());
        assert!(value.get("thumbnails").is_some());
        assert!(value.get("cache_dir").is_none());
    }
}
