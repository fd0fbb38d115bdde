use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pinmap::constants::{MAP_FILENAME, THUMBNAIL_DIR_NAME};
use pinmap::html_template::build_map;
use pinmap::processing::scan_directory;

/// Process images and generate a geolocation map.
#[derive(Parser, Debug)]
#[command(name = "pinmap", version, about)]
struct Cli {
    /// Directory containing input images
    #[arg(short, long, default_value = "input_images")]
    input_dir: PathBuf,

    /// Directory to save the map and thumbnails
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let start = Instant::now();
    info!("--- Starting pinmap ---");

    if !cli.input_dir.is_dir() {
        anyhow::bail!(
            "Input directory not found or is not a directory: {}",
            cli.input_dir.display()
        );
    }

    let thumb_dir = cli.output_dir.join(THUMBNAIL_DIR_NAME);
    let map_file = cli.output_dir.join(MAP_FILENAME);

    std::fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!("Could not create output directory {}", cli.output_dir.display())
    })?;
    info!("Using input directory: {}", cli.input_dir.display());
    info!("Using output directory: {}", cli.output_dir.display());

    let records = scan_directory(&cli.input_dir, &thumb_dir)?;
    if records.is_empty() {
        warn!("No images with usable GPS data found. Exiting.");
        return Ok(());
    }

    build_map(&records, &map_file)?;

    info!(
        "--- pinmap finished in {:.2} seconds ---",
        start.elapsed().as_secs_f64()
    );
    println!("🗺️  Map saved to: {}", map_file.display());
    println!("📷 Thumbnails saved in: {}", thumb_dir.display());
    println!("   Open {} in your browser.", MAP_FILENAME);

    Ok(())
}
