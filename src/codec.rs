//! Raw decode/encode against the codec libraries.
//!
//! Policy (color normalization, metadata, paths) lives in the compressor and
//! converter; this module only turns files into pixels and pixels into bytes.

use crate::constants::{
    AVIF_SPEED, LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, OXIPNG_PRESET, WEBP_METHOD,
    ZOPFLI_ITERATIONS,
};
use crate::error::{ProcessingError, Result};
use crate::formats::NativeFormat;
use crate::utils::validate_file_exists;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, ImageReader};
use oxipng::{Deflaters, Options};
use std::fs;
use std::io::Cursor;
use std::num::NonZeroU8;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// PNG color type byte for indexed color, at offset 25 of the file.
const PNG_INDEXED_COLOR_TYPE: u8 = 3;

/// A decoded input together with what is known about its source file.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
    /// The source stores palette indices rather than direct color.
    pub palette: bool,
    /// The source file exactly as read from disk.
    pub raw: Bytes,
    pub original_size: u64,
}

impl DecodedImage {
    pub fn has_alpha(&self) -> bool {
        self.image.color().has_alpha()
    }
}

/// Reads and decodes `path`, guessing the format from its contents.
pub fn decode(path: &Path) -> Result<DecodedImage> {
    validate_file_exists(path)?;

    let raw = Bytes::from(fs::read(path).map_err(|e| ProcessingError::decode(path, e))?);
    let original_size = fs::metadata(path)?.len();

    let reader = ImageReader::new(Cursor::new(raw.as_ref()))
        .with_guessed_format()
        .map_err(|e| ProcessingError::decode(path, e))?;
    let format = reader
        .format()
        .ok_or_else(|| ProcessingError::decode(path, "unrecognized image format"))?;
    let image = reader
        .decode()
        .map_err(|e| ProcessingError::decode(path, e))?;

    let palette = is_palette_indexed(format, &raw);
    tracing::debug!(
        path = ?path,
        ?format,
        color = ?image.color(),
        palette,
        width = image.width(),
        height = image.height(),
        "decoded image"
    );

    Ok(DecodedImage {
        image,
        format,
        palette,
        raw,
        original_size,
    })
}

fn is_palette_indexed(format: ImageFormat, raw: &[u8]) -> bool {
    match format {
        ImageFormat::Gif => true,
        ImageFormat::Png => {
            raw.get(12..16) == Some(b"IHDR".as_slice())
                && raw.get(25) == Some(&PNG_INDEXED_COLOR_TYPE)
        }
        _ => false,
    }
}

/// Encodes `img` in `format` at `quality` with the best optimization each
/// encoder offers.
pub fn encode_native(
    img: &DynamicImage,
    format: NativeFormat,
    quality: u8,
    output: &Path,
) -> Result<Vec<u8>> {
    match format {
        NativeFormat::Jpeg => encode_jpeg(img, quality, output),
        NativeFormat::Png => encode_png(img, quality, output),
        NativeFormat::WebP => encode_webp(img, quality, output),
        NativeFormat::Gif | NativeFormat::Bmp => {
            let eight_bit = if img.color().has_alpha() {
                DynamicImage::ImageRgba8(img.to_rgba8())
            } else {
                DynamicImage::ImageRgb8(img.to_rgb8())
            };
            let eight_bit = if format == NativeFormat::Gif {
                DynamicImage::ImageRgba8(eight_bit.to_rgba8())
            } else {
                eight_bit
            };
            encode_plain(&eight_bit, format.to_image_format(), output)
        }
        NativeFormat::Tiff => encode_plain(img, ImageFormat::Tiff, output),
    }
}

/// Encodes with the `image` crate's default encoder settings and nothing
/// but pixel data.
pub fn encode_plain(img: &DynamicImage, format: ImageFormat, output: &Path) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .map_err(|e| ProcessingError::encode(output, e))?;
    Ok(buffer.into_inner())
}

/// JPEG through mozjpeg with optimized Huffman tables.
pub fn encode_jpeg(img: &DynamicImage, quality: u8, output: &Path) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let (color_space, pixels) = match img {
        DynamicImage::ImageLuma8(gray) => {
            (mozjpeg::ColorSpace::JCS_GRAYSCALE, gray.as_raw().clone())
        }
        other => (mozjpeg::ColorSpace::JCS_RGB, other.to_rgb8().into_raw()),
    };

    // libjpeg reports fatal errors by unwinding
    let encoded = panic::catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut comp = mozjpeg::Compress::new(color_space);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(&pixels)?;
        comp.finish()
    }));

    match encoded {
        Ok(Ok(bytes)) => Ok(bytes),
        Ok(Err(e)) => Err(ProcessingError::encode(output, e)),
        Err(_) => Err(ProcessingError::encode(output, "mozjpeg aborted")),
    }
}

/// PNG through the `image` encoder, then oxipng.
pub fn encode_png(img: &DynamicImage, quality: u8, output: &Path) -> Result<Vec<u8>> {
    let img = match img {
        DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(img.to_rgb16()),
        DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
        other => other.clone(),
    };
    let unoptimized = encode_plain(&img, ImageFormat::Png, output)?;

    let mut options = Options::from_preset(OXIPNG_PRESET);
    // Quality only picks how hard the lossless deflater works
    options.deflate = if quality >= 90 {
        NonZeroU8::new(ZOPFLI_ITERATIONS)
            .map(|iterations| Deflaters::Zopfli { iterations })
            .unwrap_or(Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            })
    } else if quality >= 70 {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };

    oxipng::optimize_from_memory(&unoptimized, &options)
        .map_err(|e| ProcessingError::encode(output, format!("PNG optimization failed: {}", e)))
}

/// Lossy WebP through libwebp at the slowest method. Alpha is kept when the
/// image carries it.
pub fn encode_webp(img: &DynamicImage, quality: u8, output: &Path) -> Result<Vec<u8>> {
    let (width, height) = img.dimensions();
    let mut config = webp::WebPConfig::new()
        .map_err(|_| ProcessingError::encode(output, "libwebp rejected the default config"))?;
    config.quality = quality as f32;
    config.method = WEBP_METHOD;

    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), width, height)
            .encode_advanced(&config)
            .map(|memory| memory.to_vec())
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), width, height)
            .encode_advanced(&config)
            .map(|memory| memory.to_vec())
    };

    encoded.map_err(|e| ProcessingError::encode(output, format!("{:?}", e)))
}

/// AVIF through ravif at the slowest speed. Input must already be opaque RGB.
#[cfg(feature = "avif")]
pub fn encode_avif(rgb: &image::RgbImage, quality: u8, output: &Path) -> Result<Vec<u8>> {
    let (width, height) = rgb.dimensions();
    let pixels: Vec<rgb::RGB8> = rgb
        .as_raw()
        .chunks_exact(3)
        .map(|chunk| rgb::RGB8::new(chunk[0], chunk[1], chunk[2]))
        .collect();
    let buffer = ravif::Img::new(pixels.as_slice(), width as usize, height as usize);

    let encoded = ravif::Encoder::new()
        .with_quality(quality as f32)
        .with_speed(AVIF_SPEED)
        .encode_rgb(buffer)
        .map_err(|e| ProcessingError::encode(output, e))?;

    Ok(encoded.avif_file)
}

#[cfg(not(feature = "avif"))]
pub fn encode_avif(_rgb: &image::RgbImage, _quality: u8, _output: &Path) -> Result<Vec<u8>> {
    Err(ProcessingError::AvifEncoderUnavailable)
}

/// A fresh image holding only a copy of the raw pixel buffer of `img`,
/// with the same color type and dimensions.
pub fn pixels_only(img: &DynamicImage) -> DynamicImage {
    let (width, height) = img.dimensions();
    let rebuilt = match img {
        DynamicImage::ImageLuma8(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageLuma8)
        }
        DynamicImage::ImageLumaA8(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageLumaA8)
        }
        DynamicImage::ImageRgb8(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageRgb8)
        }
        DynamicImage::ImageRgba8(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageRgba8)
        }
        DynamicImage::ImageLuma16(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageLuma16)
        }
        DynamicImage::ImageLumaA16(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageLumaA16)
        }
        DynamicImage::ImageRgb16(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageRgb16)
        }
        DynamicImage::ImageRgba16(b) => {
            ImageBuffer::from_raw(width, height, b.as_raw().clone()).map(DynamicImage::ImageRgba16)
        }
        _ => None,
    };
    rebuilt.unwrap_or_else(|| img.clone())
}
