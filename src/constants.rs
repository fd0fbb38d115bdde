// Image processing
pub const THUMBNAIL_SIZE: u32 = 200;
pub const THUMBNAIL_JPEG_QUALITY: u8 = 85;
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

// Map generation
pub const DEFAULT_MAP_CENTER: (f64, f64) = (20.0, 0.0);
pub const DEFAULT_MAP_ZOOM: u8 = 2;
pub const REGIONAL_MAP_ZOOM: u8 = 6;
pub const GOOGLE_MAPS_URL_TEMPLATE: &str = "https://www.google.com/maps?q={lat},{lon}";

// Output layout
pub const MAP_FILENAME: &str = "map.html";
pub const THUMBNAIL_DIR_NAME: &str = "thumbnails";

// Timestamps: EXIF stores "2023:06:15 14:30:00", popups show "2023-06-15 14:30"
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
pub const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// Sentinel for metadata fields that are missing or undecodable
pub const MISSING_FIELD: &str = "N/A";
