use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::GenericImageView;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::{THUMBNAIL_JPEG_QUALITY, THUMBNAIL_SIZE};
use crate::exif_parser::apply_exif_orientation;

/// Creates a thumbnail for `source_path` at `thumb_path` if it does not
/// already exist.
///
/// Returns `Ok(true)` when the thumbnail exists afterwards and `Ok(false)`
/// when the source cannot be decoded as an image. Failures writing the
/// destination surface as errors. Missing parent directories are created.
pub fn ensure_thumbnail(source_path: &Path, thumb_path: &Path) -> Result<bool> {
    if thumb_path.exists() {
        debug!("Thumbnail already exists: {}", thumb_path.display());
        return Ok(true);
    }

    let img = match image::open(source_path) {
        Ok(img) => img,
        Err(e) => {
            warn!("Cannot decode {} as an image: {}", source_path.display(), e);
            return Ok(false);
        }
    };
    let img = apply_exif_orientation(source_path, img);

    // Triangle is sufficient for thumbnails and much faster than Lanczos.
    // Sources already within bounds are kept as-is, never upscaled.
    let (width, height) = img.dimensions();
    let scaled = if width > THUMBNAIL_SIZE || height > THUMBNAIL_SIZE {
        img.resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Triangle)
    } else {
        img
    };

    if let Some(parent) = thumb_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create thumbnail directory {}", parent.display())
        })?;
    }

    // The thumbnail keeps the source extension, so pick the encoder from it
    let ext = thumb_path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    if ext == "jpg" || ext == "jpeg" {
        let file = File::create(thumb_path)
            .with_context(|| format!("Failed to create {}", thumb_path.display()))?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), THUMBNAIL_JPEG_QUALITY);
        encoder
            .encode_image(&scaled.to_rgb8())
            .with_context(|| format!("Failed to encode thumbnail {}", thumb_path.display()))?;
    } else {
        scaled
            .save(thumb_path)
            .with_context(|| format!("Failed to save thumbnail {}", thumb_path.display()))?;
    }

    info!("Created thumbnail: {}", thumb_path.display());
    Ok(true)
}
