//! Compress an image in its own format.

use crate::codec;
use crate::error::Result;
use crate::formats::{MetadataSupport, NativeFormat};
use crate::metadata::MetadataSnapshot;
use crate::processing::{ProcessingRequest, ProcessingResult};
use crate::utils::write_atomically;
use image::DynamicImage;
use tracing::{debug, info};

/// Re-encode the request's input in its native format at the request's
/// quality. Never panics and never returns an error; failures are folded
/// into the result.
pub fn compress(request: &ProcessingRequest) -> ProcessingResult {
    match try_compress(request) {
        Ok(result) => {
            info!(input = ?request.input_path(), reduction = result.reduction_pct, "compressed");
            result
        }
        Err(e) => {
            debug!(input = ?request.input_path(), error = %e, "compression failed");
            ProcessingResult::failed(&e)
        }
    }
}

fn try_compress(request: &ProcessingRequest) -> Result<ProcessingResult> {
    let decoded = codec::decode(request.input_path())?;
    let format = NativeFormat::from_image_format(decoded.format)?;

    let image = if format.is_jpeg_class() && decoded.has_alpha() {
        // Alpha is dropped outright, not composited
        DynamicImage::ImageRgb8(decoded.image.to_rgb8())
    } else {
        decoded.image.clone()
    };

    let encoded = codec::encode_native(&image, format, request.quality(), request.output_path())?;

    let support = if request.remove_metadata() {
        MetadataSupport::None
    } else {
        format.metadata_support()
    };
    let encoded = MetadataSnapshot::capture(&decoded.raw).apply(encoded, support);

    let output_size = write_atomically(request.output_path(), &encoded)?;
    Ok(ProcessingResult::written(
        "Compressed",
        request.output_path(),
        decoded.original_size,
        output_size,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::FailureKind;
    use image::{GenericImageView, ImageFormat, Rgba, RgbaImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_compress_png_keeps_format_and_dimensions() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.png");
        let output = dir.path().join("out").join("in.png");
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(24, 12, Rgba([200, 10, 10, 128])))
            .save(&input)
            .unwrap();

        let result = compress(&ProcessingRequest::compress(&input, &output, 60, false));

        assert!(result.success, "{}", result.message);
        assert_eq!(result.output_size_bytes, fs::metadata(&output).unwrap().len());
        let written = image::open(&output).unwrap();
        assert_eq!(written.dimensions(), (24, 12));
        assert!(written.color().has_alpha());
        assert_eq!(
            image::ImageFormat::from_path(&output).unwrap(),
            ImageFormat::Png
        );
    }

    #[test]
    fn test_compress_undecodable_input_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("broken.jpg");
        let output = dir.path().join("broken_out.jpg");
        fs::write(&input, b"\xFF\xD8 truncated").unwrap();

        let result = compress(&ProcessingRequest::compress(&input, &output, 80, false));

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::Decode));
        assert_eq!(result.reduction_pct, 0.0);
        assert!(!output.exists());
    }
}
