pub const DEFAULT_QUALITY: u8 = 85;
pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 100;

// Named quality presets
pub const PRESET_WEB_QUALITY: u8 = 75;
pub const PRESET_BALANCED_QUALITY: u8 = 85;
pub const PRESET_HIGH_QUALITY: u8 = 95;

pub const ZOPFLI_ITERATIONS: u8 = 15;
pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;
pub const OXIPNG_PRESET: u8 = 4;

/// libwebp `method`: 6 is the slowest and smallest.
pub const WEBP_METHOD: i32 = 6;
/// ravif speed: 1 is the slowest and smallest.
pub const AVIF_SPEED: u8 = 1;

pub const WHITE: u8 = 255;

pub const KEEP_ORIGINAL_LABEL: &str = "Keep Original";
pub const WEBP_LABEL: &str = "WebP";
pub const AVIF_LABEL: &str = "AVIF";

pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub const UNKNOWN_TIME: &str = "Unknown";
pub const MODIFIED_TIME_FORMAT: &str = "%b %d, %Y %H:%M";

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif", "gif",
];

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Original size:";
pub const OUTPUT_SIZE_PREFIX: &str = "📈 Output size:";
pub const REDUCTION_PREFIX: &str = "🎯 Reduction:";
pub const SUCCESS_PREFIX: &str = "✅";
pub const SKIPPED_PREFIX: &str = "⏭️";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
