//! Scan a directory of photos, extract GPS positions from their EXIF
//! metadata, write thumbnails, and render everything as a single
//! interactive HTML map.

pub mod constants;
pub mod exif_parser;
pub mod html_template;
pub mod image_processing;
pub mod processing;

#[cfg(test)]
mod test_support;
