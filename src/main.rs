use clap::{Parser, Subcommand};
use gallery_media::config::{ThumbOptions, WatermarkSettings};
use gallery_media::imaging::{PixelBackend, Rotation, selected_backend};
use gallery_media::{rotate, thumbs, watermark};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Source file extensions the pipeline accepts.
const SOURCE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Parser)]
#[command(name = "gallery-media")]
#[command(about = "Maintenance CLI for the gallery derived-media pipeline")]
#[command(long_about = "\
Maintenance CLI for the gallery derived-media pipeline

The storage root is the directory the web application keeps uploaded
images under; thumbnails are cached beneath <root>/thumbs/ and watermark
settings are read from <root>/settings.toml.

  <root>/
  ├── settings.toml                # Watermark text / brightness / angle
  ├── photos/section_1/dawn.jpg    # Source images (owned by the web app)
  └── thumbs/3f/a2/dawn_<digest>.jpg  # Cache artifacts (owned by this tool)")]
#[command(version)]
struct Cli {
    /// Storage root all source and artifact paths resolve under
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ensure every source image under the root has a fresh thumbnail
    Thumbs,
    /// Rotate a source image in place and refresh its thumbnail
    Rotate {
        /// Source path relative to the storage root
        #[arg(long)]
        path: String,
        /// Direction of the quarter-turn
        #[arg(long, value_parser = ["left", "right"])]
        direction: String,
    },
    /// Render a watermarked rendition to a file for inspection
    Watermark {
        /// Source path relative to the storage root
        #[arg(long)]
        path: String,
        /// Output file for the watermarked JPEG
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let backend = selected_backend();

    match cli.command {
        Command::Thumbs => generate_all_thumbs(backend, &cli.root),
        Command::Rotate { path, direction } => {
            let rotation = if direction == "left" {
                Rotation::Left90
            } else {
                Rotation::Right90
            };
            rotate::rotate_in_place(backend, &cli.root, &path, rotation)?;
            println!("rotated {path} {direction}");
        }
        Command::Watermark { path, out } => {
            let settings = WatermarkSettings::load(&cli.root);
            let bytes = watermark::render_watermarked(backend, &cli.root, &path, &settings)?;
            std::fs::write(&out, bytes)?;
            println!("wrote {}", out.display());
        }
    }

    Ok(())
}

/// Walk the storage root and ensure every source has a fresh artifact.
///
/// Skips the artifact tree itself and anything that isn't a supported
/// raster. Failures are counted, not fatal — the next run retries them.
fn generate_all_thumbs(backend: &impl PixelBackend, root: &Path) {
    let artifact_root = root.join(gallery_media::cache_key::ARTIFACT_DIR);
    let opts = ThumbOptions::default();

    let sources: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.path() != artifact_root)
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && has_source_extension(e.path()))
        .filter_map(|e| {
            e.path()
                .strip_prefix(root)
                .ok()
                .map(|rel| rel.to_string_lossy().replace('\\', "/"))
        })
        .collect();

    let fresh = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    sources.par_iter().for_each(|rel| {
        match thumbs::ensure_thumbnail(backend, root, rel, &opts) {
            Some(_) => fresh.fetch_add(1, Ordering::Relaxed),
            None => failed.fetch_add(1, Ordering::Relaxed),
        };
    });

    println!("checked: {}", sources.len());
    println!("generated_or_fresh: {}", fresh.load(Ordering::Relaxed));
    println!("missing_or_failed: {}", failed.load(Ordering::Relaxed));
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SOURCE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
