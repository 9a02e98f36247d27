//! Utility functions for common operations
//!
//! This module contains helper functions that are used across multiple modules
//! to reduce code duplication and improve maintainability.

use crate::constants::{
    MAX_QUALITY, MIN_QUALITY, MODIFIED_TIME_FORMAT, SUPPORTED_IMAGE_EXTENSIONS, UNKNOWN_TIME,
};
use crate::error::{ProcessingError, Result};
use chrono::{Local, TimeZone};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Check if a file path represents a supported image file
///
/// # Arguments
/// * `path` - The file path to check
///
/// # Returns
/// * `true` if the file has a supported image extension, `false` otherwise
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

/// Validate that a file exists and return a descriptive error if not
pub fn validate_file_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ProcessingError::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Clamp any integer quality into the encoder range `[1, 100]`.
pub fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(MIN_QUALITY as i64, MAX_QUALITY as i64) as u8
}

/// Format file size in human-readable format
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size string (e.g., "1.2 MB", "512 B")
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    const THRESHOLD: f64 = 1024.0;

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format a modification time in local time, e.g. "Jan 12, 2026 14:30".
///
/// Returns "Unknown" when the timestamp cannot be represented.
pub fn format_modified_time(time: SystemTime) -> String {
    let seconds = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).ok(),
        Err(before) => i64::try_from(before.duration().as_secs()).ok().map(|s| -s),
    };

    seconds
        .and_then(|s| Local.timestamp_opt(s, 0).earliest())
        .map(|dt| dt.format(MODIFIED_TIME_FORMAT).to_string())
        .unwrap_or_else(|| UNKNOWN_TIME.to_string())
}

/// Size reduction as a percentage
///
/// Positive means the output is smaller; negative values mean it grew and
/// are reported as-is.
pub fn calculate_reduction_pct(original_size: u64, output_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    ((original_size as f64 - output_size as f64) / original_size as f64) * 100.0
}

/// Write `bytes` to `path` through a temp file in the same directory.
///
/// The destination only ever sees the complete, synced file; on any error the
/// temp file is removed and `path` is left untouched. Returns the on-disk size.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<u64> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|_| ProcessingError::OutputDirectoryUnavailable(parent.to_path_buf()))?;

    let mut temp = tempfile::Builder::new()
        .prefix(".imgpress-")
        .suffix(".part")
        .tempfile_in(parent)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(fs::metadata(path)?.len())
}
