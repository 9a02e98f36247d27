//! Image format handling and encoder capability probing
//!
//! This module provides type-safe format handling for the three format
//! concerns of the pipeline: the batch-level output selection, the
//! conversion target, and the native format of a decoded input.

use crate::constants::{AVIF_LABEL, KEEP_ORIGINAL_LABEL, WEBP_LABEL};
use crate::error::{ProcessingError, Result};
use image::ImageFormat;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// How much container metadata an encoded format can carry forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataSupport {
    /// EXIF payload and ICC profile
    Full,
    /// EXIF payload only
    ExifOnly,
    /// Nothing is carried forward
    None,
}

impl MetadataSupport {
    pub fn carries_exif(&self) -> bool {
        !matches!(self, MetadataSupport::None)
    }

    pub fn carries_icc(&self) -> bool {
        matches!(self, MetadataSupport::Full)
    }
}

/// Batch-level output format choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OutputSelection {
    /// Compress in the input's own format
    KeepOriginal,
    WebP,
    Avif,
}

impl OutputSelection {
    pub fn label(&self) -> &'static str {
        match self {
            OutputSelection::KeepOriginal => KEEP_ORIGINAL_LABEL,
            OutputSelection::WebP => WEBP_LABEL,
            OutputSelection::Avif => AVIF_LABEL,
        }
    }

    /// Lenient parse of a display label. Unrecognized labels fall back to
    /// `KeepOriginal` so that naming never fails.
    pub fn from_label(label: &str) -> Self {
        match label {
            WEBP_LABEL => OutputSelection::WebP,
            AVIF_LABEL => OutputSelection::Avif,
            _ => OutputSelection::KeepOriginal,
        }
    }

    /// The conversion target, or `None` when compressing in place.
    pub fn target(&self) -> Option<TargetFormat> {
        match self {
            OutputSelection::KeepOriginal => None,
            OutputSelection::WebP => Some(TargetFormat::WebP),
            OutputSelection::Avif => Some(TargetFormat::Avif),
        }
    }
}

impl fmt::Display for OutputSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputSelection {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "keep" | "keep-original" | "keep original" | "original" => {
                Ok(OutputSelection::KeepOriginal)
            }
            "webp" => Ok(OutputSelection::WebP),
            "avif" => Ok(OutputSelection::Avif),
            _ => Err(ProcessingError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Formats the converter can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetFormat {
    WebP,
    Avif,
}

impl TargetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::WebP => "webp",
            TargetFormat::Avif => "avif",
        }
    }

    pub fn metadata_support(&self) -> MetadataSupport {
        match self {
            TargetFormat::WebP => MetadataSupport::ExifOnly,
            // ravif writes a bare AVIF container
            TargetFormat::Avif => MetadataSupport::None,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetFormat::WebP => "WEBP",
            TargetFormat::Avif => "AVIF",
        };
        f.write_str(name)
    }
}

impl FromStr for TargetFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "webp" => Ok(TargetFormat::WebP),
            "avif" => Ok(TargetFormat::Avif),
            _ => Err(ProcessingError::UnsupportedFormat(format!(
                "Unsupported target format: {}",
                s
            ))),
        }
    }
}

/// Formats the compressor can re-encode in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
    Tiff,
}

impl NativeFormat {
    pub fn from_image_format(format: ImageFormat) -> Result<Self> {
        match format {
            ImageFormat::Jpeg => Ok(NativeFormat::Jpeg),
            ImageFormat::Png => Ok(NativeFormat::Png),
            ImageFormat::WebP => Ok(NativeFormat::WebP),
            ImageFormat::Gif => Ok(NativeFormat::Gif),
            ImageFormat::Bmp => Ok(NativeFormat::Bmp),
            ImageFormat::Tiff => Ok(NativeFormat::Tiff),
            other => Err(ProcessingError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            NativeFormat::Jpeg => ImageFormat::Jpeg,
            NativeFormat::Png => ImageFormat::Png,
            NativeFormat::WebP => ImageFormat::WebP,
            NativeFormat::Gif => ImageFormat::Gif,
            NativeFormat::Bmp => ImageFormat::Bmp,
            NativeFormat::Tiff => ImageFormat::Tiff,
        }
    }

    /// Lossy formats with no alpha channel
    pub fn is_jpeg_class(&self) -> bool {
        matches!(self, NativeFormat::Jpeg)
    }

    pub fn metadata_support(&self) -> MetadataSupport {
        match self {
            NativeFormat::Jpeg | NativeFormat::Png => MetadataSupport::Full,
            NativeFormat::WebP => MetadataSupport::ExifOnly,
            NativeFormat::Gif | NativeFormat::Bmp | NativeFormat::Tiff => MetadataSupport::None,
        }
    }
}

impl fmt::Display for NativeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeFormat::Jpeg => "JPEG",
            NativeFormat::Png => "PNG",
            NativeFormat::WebP => "WEBP",
            NativeFormat::Gif => "GIF",
            NativeFormat::Bmp => "BMP",
            NativeFormat::Tiff => "TIFF",
        };
        f.write_str(name)
    }
}

/// Encoders available in this build.
///
/// Constructed once at startup and shared by reference; encoder availability
/// cannot change while the process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatCapabilities {
    avif: bool,
}

impl FormatCapabilities {
    pub fn detect() -> Self {
        Self {
            avif: cfg!(feature = "avif"),
        }
    }

    /// Explicit capabilities, e.g. to simulate an environment without AVIF.
    pub fn new(avif: bool) -> Self {
        Self { avif }
    }

    pub fn is_avif_supported(&self) -> bool {
        self.avif
    }

    pub fn supports(&self, selection: OutputSelection) -> bool {
        match selection {
            OutputSelection::Avif => self.avif,
            OutputSelection::KeepOriginal | OutputSelection::WebP => true,
        }
    }

    pub fn supported_output_formats(&self) -> Vec<&'static str> {
        let mut formats = vec![KEEP_ORIGINAL_LABEL, WEBP_LABEL];
        if self.avif {
            formats.push(AVIF_LABEL);
        }
        formats
    }
}

impl Default for FormatCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}
