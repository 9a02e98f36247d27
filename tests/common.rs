#![allow(dead_code)]

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use img_parts::jpeg::Jpeg;
use img_parts::ImageEXIF;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn create_test_output_directory(temp_dir: &Path) -> PathBuf {
    let output_dir = temp_dir.join("output");
    std::fs::create_dir(&output_dir).unwrap();
    output_dir
}

/// A gradient so encoders have real content to work with.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
    })
}

pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(&path, ImageFormat::Jpeg)
        .unwrap();
    path
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgb8(gradient(width, height))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

pub fn write_rgba_png(dir: &Path, name: &str, width: u32, height: u32, pixel: [u8; 4]) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(pixel)))
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

/// A JPEG carrying a single EXIF `Make` field.
pub fn write_jpeg_with_exif(dir: &Path, name: &str, make: &str) -> PathBuf {
    let field = Field {
        tag: Tag::Make,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![make.as_bytes().to_vec()]),
    };
    let mut writer = Writer::new();
    writer.push_field(&field);
    let mut exif = Cursor::new(Vec::new());
    writer.write(&mut exif, false).unwrap();

    let mut plain = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(gradient(32, 32))
        .write_to(&mut plain, ImageFormat::Jpeg)
        .unwrap();
    let mut jpeg = Jpeg::from_bytes(plain.into_inner().into()).unwrap();
    jpeg.set_exif(Some(exif.into_inner().into()));

    let path = dir.join(name);
    std::fs::write(&path, jpeg.encoder().bytes()).unwrap();
    path
}

pub fn create_nested_directory_structure(temp_dir: &Path) -> PathBuf {
    let subdir = temp_dir.join("subdir");
    std::fs::create_dir(&subdir).unwrap();
    write_jpeg(&subdir, "nested.jpg", 16, 16);
    std::fs::write(subdir.join("nested.txt"), b"nested text").unwrap();
    subdir
}
