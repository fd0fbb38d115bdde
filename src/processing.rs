use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::{
    DISPLAY_DATETIME_FORMAT, EXIF_DATETIME_FORMAT, MISSING_FIELD, SUPPORTED_EXTENSIONS,
};
use crate::exif_parser;
use crate::image_processing::ensure_thumbnail;

/// One geolocated photo, ready to be placed on the map.
///
/// A record exists only for files that decoded as an image, carried valid
/// GPS tags, and got a thumbnail written; it is never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoRecord {
    pub original_path: String,
    /// Forward-slash path relative to the output root (the thumbnail
    /// directory's parent), usable directly as an `img src` in the map.
    pub thumbnail_rel_path: String,
    pub latitude: f64,
    pub longitude: f64,
    pub datetime: String,
    pub model: String,
}

/// Processes one image file: reads tags, extracts coordinates and metadata,
/// creates the thumbnail, and assembles the record.
///
/// Every per-file failure (no EXIF, no GPS, undecodable content, thumbnail
/// error) is logged and degrades to `None` so one bad file never aborts the
/// scan.
pub fn process_image(image_path: &Path, thumb_dir: &Path) -> Option<PhotoRecord> {
    match try_process(image_path, thumb_dir) {
        Ok(record) => {
            info!("Processed {}", image_path.display());
            Some(record)
        }
        Err(e) => {
            warn!("Skipping {}: {:#}", image_path.display(), e);
            None
        }
    }
}

fn try_process(image_path: &Path, thumb_dir: &Path) -> Result<PhotoRecord> {
    let tags = exif_parser::read_tags(image_path)?;

    let (latitude, longitude) = match exif_parser::extract_coordinates(&tags) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => anyhow::bail!("no usable GPS coordinates"),
    };

    // Missing datetime/model never block the pipeline, the sentinel is fine
    let datetime = format_capture_datetime(&exif_parser::extract_datetime(&tags));
    let model = exif_parser::extract_model(&tags);

    let thumb_path = thumbnail_path(image_path, thumb_dir);
    if !ensure_thumbnail(image_path, &thumb_path)? {
        anyhow::bail!("thumbnail creation failed");
    }

    Ok(PhotoRecord {
        original_path: image_path.to_string_lossy().to_string(),
        thumbnail_rel_path: relative_to_output(&thumb_path, thumb_dir),
        latitude,
        longitude,
        datetime,
        model,
    })
}

/// Scans the direct entries of `input_dir` (no recursion) and returns a
/// record per geolocated image, in enumeration order.
///
/// The thumbnail directory is created up front; failure to do so aborts the
/// run, since no output can be produced without it.
pub fn scan_directory(input_dir: &Path, thumb_dir: &Path) -> Result<Vec<PhotoRecord>> {
    info!("Scanning directory: {}", input_dir.display());
    fs::create_dir_all(thumb_dir).with_context(|| {
        format!("Failed to create thumbnail directory {}", thumb_dir.display())
    })?;

    // Direct entries only; standard filters are off so enumeration is purely
    // extension-driven (hidden files included)
    let files: Vec<PathBuf> = WalkBuilder::new(input_dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().map_or(false, |ft| ft.is_file()))
        .map(|e| e.into_path())
        .filter(|path| has_supported_extension(path))
        .collect();

    info!("Found {} candidate images", files.len());

    // Per-file work is independent; the index re-establishes enumeration
    // order after the parallel pass
    let mut indexed: Vec<(usize, PhotoRecord)> = files
        .par_iter()
        .enumerate()
        .filter_map(|(idx, path)| process_image(path, thumb_dir).map(|record| (idx, record)))
        .collect();
    indexed.sort_by_key(|&(idx, _)| idx);

    let records: Vec<PhotoRecord> = indexed.into_iter().map(|(_, record)| record).collect();
    info!(
        "Scan complete: {} of {} candidates had usable GPS data",
        records.len(),
        files.len()
    );
    Ok(records)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .map_or(false, |ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// `{stem}_thumb{ext}` inside the thumbnail directory, keeping the source
/// extension (and its case) so the encoder matches the original format.
fn thumbnail_path(image_path: &Path, thumb_dir: &Path) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("photo");
    let name = match image_path.extension().and_then(|s| s.to_str()) {
        Some(ext) => format!("{stem}_thumb.{ext}"),
        None => format!("{stem}_thumb"),
    };
    thumb_dir.join(name)
}

fn relative_to_output(thumb_path: &Path, thumb_dir: &Path) -> String {
    let output_root = thumb_dir.parent().unwrap_or(thumb_dir);
    let rel = thumb_path.strip_prefix(output_root).unwrap_or(thumb_path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Renders an EXIF timestamp for display, leaving unparseable values and the
/// `"N/A"` sentinel untouched.
fn format_capture_datetime(raw: &str) -> String {
    if raw == MISSING_FIELD {
        return raw.to_string();
    }
    match NaiveDateTime::parse_from_str(raw, EXIF_DATETIME_FORMAT) {
        Ok(dt) => dt.format(DISPLAY_DATETIME_FORMAT).to_string(),
        Err(_) => raw.to_string(),
    }
}
