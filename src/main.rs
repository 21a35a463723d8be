use clap::{Parser, Subcommand};
use gallery_index::catalog::Catalog;
use gallery_index::upload::{self, CollectionTarget};
use gallery_index::{config, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gallery-index")]
#[command(about = "Catalog a tree of image collections and keep its thumbnails")]
#[command(long_about = "\
Catalog a tree of image collections and keep its thumbnails

Every first-level directory under the root is a collection. Images directly
under the root belong to the \"root\" collection. Thumbnails are mirrored
under <root>/.thumbnails and generated the first time they are needed.

Layout:

  outputs/
  ├── config.toml          # Optional, see 'gallery-index gen-config'
  ├── img2.png             # Collection \"root\"
  ├── catA/                # Collection \"catA\"
  │   ├── img1.jpg
  │   └── sub/img3.png     # Nested images belong to catA too
  └── .thumbnails/         # Cache, never listed
      └── catA/img1.jpg

Metadata resolution (first available wins):
  Title:   PNG parameters → EXIF UserComment → ImageDescription → Title → file stem
  Author:  EXIF Artist → Author → XMP creator → \"Unknown\"

Set RUST_LOG to change log verbosity and LOG_FORMAT=json for JSON logs.")]
#[command(version)]
struct Cli {
    /// Root of the indexed tree (overrides `root` in the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file; a missing file means stock defaults
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the catalog as JSON
    Catalog,
    /// Print the collection names as JSON
    Collections,
    /// Make sure one image has a thumbnail
    Thumbnail {
        /// Image path relative to the root, `/`-separated
        relative_path: String,
    },
    /// Copy an image into the tree and generate its thumbnail
    Add {
        /// Image file to import
        file: PathBuf,
        /// Existing collection to place it in
        #[arg(long, conflicts_with = "new_collection")]
        collection: Option<String>,
        /// New collection to create for it
        #[arg(long)]
        new_collection: Option<String>,
        /// Name to store it under (defaults to the file's own name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Scan the tree and report collections, skipped images and cache activity
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging();
    let open = || open_catalog(cli.root.clone(), &cli.config);

    match cli.command {
        Command::Catalog => {
            let records = open()?.list_catalog()?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Command::Collections => {
            let collections = open()?.list_collections()?;
            println!("{}", serde_json::to_string_pretty(&collections)?);
        }
        Command::Thumbnail { ref relative_path } => {
            let catalog = open()?;
            let source = catalog.config().root.join(relative_path);
            let status = catalog.ensure_thumbnail(relative_path, &source)?;
            println!("{}", output::format_thumbnail_status(relative_path, status));
        }
        Command::Add {
            ref file,
            ref collection,
            ref new_collection,
            ref name,
        } => {
            let target = match (collection, new_collection) {
                (Some(existing), _) => CollectionTarget::Existing(existing.clone()),
                (None, Some(new)) => CollectionTarget::New(new.clone()),
                (None, None) => CollectionTarget::Root,
            };
            let original_name = name.clone().unwrap_or_else(|| file_name_of(file));
            let outcome = upload::import(&open()?, file, &original_name, &target)?;
            output::print_upload_outcome(&outcome);
        }
        Command::Check => {
            let catalog = open()?;
            println!("==> Checking {}", catalog.config().root.display());
            let report = catalog.scan()?;
            let collections = catalog.list_collections()?;
            output::print_check_output(&report, &collections);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file and apply the `--root` override.
fn open_catalog(
    root: Option<PathBuf>,
    config_path: &Path,
) -> Result<Catalog, Box<dyn std::error::Error>> {
    let mut gallery_config = config::load_config(config_path)?;
    if let Some(root) = root {
        gallery_config.root = root;
    }
    Ok(Catalog::new(gallery_config)?)
}

/// Logs go to stderr so command output on stdout stays machine-readable.
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gallery_index=info".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
