use crate::codec;
use crate::constants::UNKNOWN_TIME;
use crate::error::Result;
use crate::metadata::has_exif_data;
use crate::utils::{format_file_size, format_modified_time};
use image::{ColorType, DynamicImage, GenericImageView};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub color_type: String,
    pub has_alpha: bool,
    pub palette: bool,
    pub has_exif: bool,
    pub file_size_bytes: u64,
    pub modified: String,
    pub megapixels: f64,
    pub estimated_memory_mb: f64,
}

pub fn get_image_info(input_path: &Path) -> Result<ImageInfo> {
    let decoded = codec::decode(input_path)?;
    let (width, height) = decoded.image.dimensions();
    let modified = fs::metadata(input_path)?
        .modified()
        .map(format_modified_time)
        .unwrap_or_else(|_| UNKNOWN_TIME.to_string());

    Ok(ImageInfo {
        path: input_path.to_path_buf(),
        format: format!("{:?}", decoded.format).to_uppercase(),
        width,
        height,
        color_type: format!("{:?}", decoded.image.color()),
        has_alpha: decoded.has_alpha(),
        palette: decoded.palette,
        has_exif: has_exif_data(input_path),
        file_size_bytes: decoded.original_size,
        modified,
        megapixels: (width as u64 * height as u64) as f64 / 1_000_000.0,
        estimated_memory_mb: estimate_memory_usage(&decoded.image),
    })
}

pub fn print_image_info(info: &ImageInfo) {
    println!("📋 Basic Information:");
    println!("  📁 File: {:?}", info.path);
    println!("  📏 Dimensions: {}x{} pixels", info.width, info.height);
    println!(
        "  📦 File size: {} ({} bytes)",
        format_file_size(info.file_size_bytes),
        info.file_size_bytes
    );
    println!("  🕒 Modified: {}", info.modified);
    println!("  🎨 Color type: {}", info.color_type);
    println!("  🎭 Image format: {}", info.format);
    println!("  🔢 Megapixels: {:.2} MP", info.megapixels);
    println!("  💾 Estimated memory usage: {:.2} MB", info.estimated_memory_mb);
    println!(
        "  🏷️  EXIF metadata: {}",
        if info.has_exif { "present" } else { "none" }
    );

    println!("\n💡 Suggestions:");
    if info.file_size_bytes > 5 * 1024 * 1024 {
        println!("  🎯 Large file (>5MB): the Web preset (quality 75) trades little visible detail");
    } else if info.file_size_bytes > 1024 * 1024 {
        println!("  🎯 Medium file (1-5MB): the Balanced preset (quality 85) is a good fit");
    } else {
        println!("  🎯 Small file (<1MB): the High preset (quality 95) keeps the most detail");
    }

    match info.format.as_str() {
        "PNG" if info.has_alpha => {
            println!(
                "  🎭 PNG with transparency: WebP keeps the alpha channel, AVIF flattens it onto white"
            );
        }
        "PNG" | "BMP" | "TIFF" => {
            println!("  🎭 Lossless source: converting to WebP or AVIF usually shrinks it the most");
        }
        "JPEG" => {
            println!("  🎭 JPEG format: adjust quality for the size/quality balance");
        }
        "WEBP" => {
            println!("  🎭 WebP format: already well compressed, consider a lower quality");
        }
        _ => {}
    }
    if info.palette {
        println!("  🎨 Palette image: converting composites any transparency onto white");
    }
}

fn estimate_memory_usage(img: &DynamicImage) -> f64 {
    let (width, height) = img.dimensions();
    let bytes_per_pixel = match img.color() {
        ColorType::L8 => 1,
        ColorType::La8 | ColorType::L16 => 2,
        ColorType::Rgb8 => 3,
        ColorType::Rgba8 | ColorType::La16 => 4,
        ColorType::Rgb16 => 6,
        ColorType::Rgba16 => 8,
        ColorType::Rgb32F => 12,
        ColorType::Rgba32F => 16,
        _ => 4,
    };

    (width as u64 * height as u64 * bytes_per_pixel) as f64 / (1024.0 * 1024.0)
}
