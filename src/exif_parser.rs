use anyhow::{Context, Result};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use crate::constants::MISSING_FIELD;

/// The metadata tags of one file, pulled out of its EXIF block.
///
/// Each field is `None` when the tag is missing or its value does not have
/// the expected shape, so the extractors below never see a malformed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTags {
    pub latitude: Option<[f64; 3]>,
    pub latitude_ref: Option<char>,
    pub longitude: Option<[f64; 3]>,
    pub longitude_ref: Option<char>,
    pub datetime: Option<String>,
    pub model: Option<String>,
}

impl RawTags {
    pub fn from_exif(exif: &exif::Exif) -> Self {
        RawTags {
            latitude: dms_triplet(exif, Tag::GPSLatitude),
            latitude_ref: hemisphere_ref(exif, Tag::GPSLatitudeRef),
            longitude: dms_triplet(exif, Tag::GPSLongitude),
            longitude_ref: hemisphere_ref(exif, Tag::GPSLongitudeRef),
            // DateTimeOriginal first, then the more general DateTime
            datetime: ascii_tag(exif, &[Tag::DateTimeOriginal, Tag::DateTime]),
            model: ascii_tag(exif, &[Tag::Model]),
        }
    }
}

/// Reads the EXIF block of `path` into a [`RawTags`].
///
/// A file with no EXIF data at all is an error; a partially broken EXIF
/// block is read as far as possible.
pub fn read_tags(path: &Path) -> Result<RawTags> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut buf_reader = BufReader::new(file);
    let mut exif_reader = Reader::new();
    exif_reader.continue_on_error(true); // Tolerate non-standard EXIF structures

    match exif_reader.read_from_container(&mut buf_reader) {
        Ok(exif) => Ok(RawTags::from_exif(&exif)),
        Err(exif::Error::PartialResult(partial)) => {
            let (exif, errors) = partial.into_inner();
            debug!(
                "Partial EXIF in {} ({} field errors)",
                path.display(),
                errors.len()
            );
            Ok(RawTags::from_exif(&exif))
        }
        Err(e) => Err(e).with_context(|| format!("No EXIF data in {}", path.display())),
    }
}

fn dms_triplet(exif: &exif::Exif, tag: Tag) -> Option<[f64; 3]> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    if let Value::Rational(ref vec) = field.value {
        if vec.len() == 3 {
            return Some([vec[0].to_f64(), vec[1].to_f64(), vec[2].to_f64()]);
        }
    }
    debug!("Tag {} is not a degrees/minutes/seconds triplet", tag);
    None
}

fn hemisphere_ref(exif: &exif::Exif, tag: Tag) -> Option<char> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    field.display_value().to_string().chars().next()
}

fn ascii_tag(exif: &exif::Exif, tags: &[Tag]) -> Option<String> {
    for &tag in tags {
        if let Some(field) = exif.get_field(tag, In::PRIMARY) {
            if let Value::Ascii(ref vec) = field.value {
                if let Some(bytes) = vec.first() {
                    if let Ok(s) = std::str::from_utf8(bytes) {
                        let s = s.trim_end_matches('\0').trim();
                        if !s.is_empty() {
                            return Some(s.to_string());
                        }
                    }
                }
            }
        }
    }
    None
}

/// Converts a degrees/minutes/seconds angle to signed decimal degrees.
///
/// South and west hemispheres are negative. Components are combined
/// arithmetically with no range validation, so out-of-range minutes or
/// seconds pass straight through.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let mut decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if hemisphere == 'S' || hemisphere == 'W' {
        decimal = -decimal;
    }
    decimal
}

/// Extracts decimal-degree coordinates from the tag set.
///
/// All four GPS tags (both value triplets and both hemisphere refs) are
/// required; if any is missing the result is `(None, None)`, a normal
/// "no GPS" outcome rather than an error.
pub fn extract_coordinates(tags: &RawTags) -> (Option<f64>, Option<f64>) {
    match (
        tags.latitude,
        tags.latitude_ref,
        tags.longitude,
        tags.longitude_ref,
    ) {
        (Some(lat), Some(lat_ref), Some(lon), Some(lon_ref)) => {
            let lat = dms_to_decimal(lat[0], lat[1], lat[2], lat_ref);
            let lon = dms_to_decimal(lon[0], lon[1], lon[2], lon_ref);
            debug!("Converted coords: lat {}, lon {}", lat, lon);
            (Some(lat), Some(lon))
        }
        _ => {
            debug!("Missing required GPS tags for coordinate conversion");
            (None, None)
        }
    }
}

/// Returns the capture timestamp tag's string form, or `"N/A"`.
pub fn extract_datetime(tags: &RawTags) -> String {
    tags.datetime
        .clone()
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

/// Returns the device model tag's string form, or `"N/A"`.
pub fn extract_model(tags: &RawTags) -> String {
    tags.model
        .clone()
        .unwrap_or_else(|| MISSING_FIELD.to_string())
}

/// Applies the EXIF orientation tag to a decoded image.
pub fn apply_exif_orientation(source_path: &Path, img: image::DynamicImage) -> image::DynamicImage {
    let file = match File::open(source_path) {
        Ok(f) => f,
        Err(_) => return img,
    };

    let mut buf_reader = BufReader::new(&file);
    let exif = match Reader::new().read_from_container(&mut buf_reader) {
        Ok(e) => e,
        Err(_) => return img,
    };

    let orientation = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1);

    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate270().fliph(),
        6 => img.rotate90(),
        7 => img.rotate90().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}
