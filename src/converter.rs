//! Convert an image to WebP or AVIF.

use crate::codec::{self, DecodedImage};
use crate::constants::WHITE;
use crate::error::{ProcessingError, Result};
use crate::formats::{FormatCapabilities, MetadataSupport, TargetFormat};
use crate::metadata::MetadataSnapshot;
use crate::paths::with_target_extension;
use crate::processing::{ProcessingRequest, ProcessingResult};
use crate::utils::write_atomically;
use image::{DynamicImage, RgbImage, RgbaImage};
use tracing::{debug, info};

/// Re-encode the request's input into its target format. The written
/// path is the request's output path with its extension replaced by the
/// target's.
pub fn convert(request: &ProcessingRequest, capabilities: &FormatCapabilities) -> ProcessingResult {
    match try_convert(request, capabilities) {
        Ok(result) => {
            info!(input = ?request.input_path(), output = ?result.output_path, "converted");
            result
        }
        Err(e) => {
            debug!(input = ?request.input_path(), error = %e, "conversion failed");
            ProcessingResult::failed(&e)
        }
    }
}

fn try_convert(
    request: &ProcessingRequest,
    capabilities: &FormatCapabilities,
) -> Result<ProcessingResult> {
    let target: TargetFormat = request
        .target_format()
        .ok_or(ProcessingError::MissingTargetFormat)?
        .parse()?;
    if target == TargetFormat::Avif && !capabilities.is_avif_supported() {
        return Err(ProcessingError::AvifEncoderUnavailable);
    }

    let output_path = with_target_extension(request.output_path(), target);
    let decoded = codec::decode(request.input_path())?;
    let pixels = normalize_color(&decoded, target);

    let encoded = match target {
        TargetFormat::WebP => codec::encode_webp(&pixels, request.quality(), &output_path)?,
        TargetFormat::Avif => {
            codec::encode_avif(&pixels.to_rgb8(), request.quality(), &output_path)?
        }
    };

    let support = if request.remove_metadata() {
        MetadataSupport::None
    } else {
        target.metadata_support()
    };
    let encoded = MetadataSnapshot::capture(&decoded.raw).apply(encoded, support);

    let output_size = write_atomically(&output_path, &encoded)?;
    Ok(ProcessingResult::written(
        &format!("Converted to {}", target),
        &output_path,
        decoded.original_size,
        output_size,
    ))
}

/// Pixel layout handed to the target encoder.
///
/// WebP keeps a real alpha channel. AVIF output, and every palette source,
/// is composited onto white. Everything else becomes 8-bit RGB.
fn normalize_color(decoded: &DecodedImage, target: TargetFormat) -> DynamicImage {
    let keeps_alpha = target == TargetFormat::WebP && decoded.has_alpha() && !decoded.palette;
    if keeps_alpha {
        return DynamicImage::ImageRgba8(decoded.image.to_rgba8());
    }

    if decoded.has_alpha() || decoded.palette {
        DynamicImage::ImageRgb8(flatten_onto_white(&decoded.image.to_rgba8()))
    } else {
        DynamicImage::ImageRgb8(decoded.image.to_rgb8())
    }
}

/// Alpha-composite over an opaque white background.
pub fn flatten_onto_white(rgba: &RgbaImage) -> RgbImage {
    let white = WHITE as u32;
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + white * (255 - a) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
