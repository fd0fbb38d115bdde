//! Builders for small image fixtures with known EXIF payloads, so tests do
//! not depend on checked-in binaries.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// 40°44'54.3"N as EXIF rationals, ≈ 40.7484166 decimal degrees.
pub const NYC_LAT_DMS: [(u32, u32); 3] = [(40, 1), (44, 1), (543, 10)];
/// 73°59'09.5"W as EXIF rationals, ≈ -73.9859722 decimal degrees.
pub const NYC_LON_DMS: [(u32, u32); 3] = [(73, 1), (59, 1), (95, 10)];

pub const FIXTURE_DATETIME: &str = "2023:06:15 14:30:00";
pub const FIXTURE_MODEL: &str = "TestCamera S1";

/// Plain JPEG of the given dimensions, no EXIF segment at all.
pub fn plain_jpeg_sized(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// Plain PNG of the given dimensions.
pub fn plain_png_sized(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// Small JPEG with no EXIF segment.
pub fn plain_jpeg() -> Vec<u8> {
    plain_jpeg_sized(16, 16)
}

/// JPEG carrying GPS tags for the NYC fixture position plus capture
/// timestamp and device model.
pub fn jpeg_with_nyc_gps() -> Vec<u8> {
    jpeg_with_exif(true)
}

/// JPEG carrying an EXIF block (timestamp, model) but no GPS tags.
pub fn jpeg_without_gps() -> Vec<u8> {
    jpeg_with_exif(false)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 160])
    }));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode fixture image");
    buf.into_inner()
}

fn jpeg_with_exif(with_gps: bool) -> Vec<u8> {
    let mut fields = vec![
        Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![FIXTURE_DATETIME.as_bytes().to_vec()]),
        },
        Field {
            tag: Tag::Model,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![FIXTURE_MODEL.as_bytes().to_vec()]),
        },
    ];

    if with_gps {
        fields.push(Field {
            tag: Tag::GPSLatitude,
            ifd_num: In::PRIMARY,
            value: rational_triplet(NYC_LAT_DMS),
        });
        fields.push(Field {
            tag: Tag::GPSLatitudeRef,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"N".to_vec()]),
        });
        fields.push(Field {
            tag: Tag::GPSLongitude,
            ifd_num: In::PRIMARY,
            value: rational_triplet(NYC_LON_DMS),
        });
        fields.push(Field {
            tag: Tag::GPSLongitudeRef,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![b"W".to_vec()]),
        });
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("assemble EXIF block");

    splice_app1(plain_jpeg(), &tiff.into_inner())
}

fn rational_triplet(triplet: [(u32, u32); 3]) -> Value {
    Value::Rational(
        triplet
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect(),
    )
}

/// Inserts an APP1 EXIF segment directly after the JPEG SOI marker.
fn splice_app1(jpeg: Vec<u8>, tiff: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "fixture is not a JPEG");

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    // Segment length counts itself plus the Exif header and payload
    let length = (2 + 6 + tiff.len()) as u16;
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_fixture_is_a_decodable_image() {
        let bytes = jpeg_with_nyc_gps();
        let img = image::load_from_memory(&bytes).expect("decode fixture");
        assert_eq!(img.width(), 16);
    }

    #[test]
    fn gps_fixture_carries_readable_exif() {
        let bytes = jpeg_with_nyc_gps();
        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(&bytes))
            .expect("read EXIF");
        assert!(exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_some());
        assert!(exif.get_field(Tag::DateTimeOriginal, In::PRIMARY).is_some());
    }

    #[test]
    fn no_gps_fixture_has_exif_but_no_coordinates() {
        let bytes = jpeg_without_gps();
        let exif = exif::Reader::new()
            .read_from_container(&mut Cursor::new(&bytes))
            .expect("read EXIF");
        assert!(exif.get_field(Tag::GPSLatitude, In::PRIMARY).is_none());
        assert!(exif.get_field(Tag::Model, In::PRIMARY).is_some());
    }
}
