//! Per-file request and result types shared by the compressor, the converter
//! and the batch orchestrator.

use crate::constants::{
    BYTES_PER_MB, DEFAULT_QUALITY, PRESET_BALANCED_QUALITY, PRESET_HIGH_QUALITY,
    PRESET_WEB_QUALITY,
};
use crate::error::ProcessingError;
use crate::formats::FormatCapabilities;
use crate::utils::{calculate_reduction_pct, clamp_quality};
use crate::{compressor, converter};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessingMode {
    /// Re-encode in the input's own format
    Compress,
    /// Re-encode into a target format
    Convert,
}

/// Named quality levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityPreset {
    Web,
    Balanced,
    High,
}

impl QualityPreset {
    pub fn quality(&self) -> u8 {
        match self {
            QualityPreset::Web => PRESET_WEB_QUALITY,
            QualityPreset::Balanced => PRESET_BALANCED_QUALITY,
            QualityPreset::High => PRESET_HIGH_QUALITY,
        }
    }
}

impl FromStr for QualityPreset {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "web" => Ok(QualityPreset::Web),
            "balanced" => Ok(QualityPreset::Balanced),
            "high" => Ok(QualityPreset::High),
            _ => Err(ProcessingError::UnsupportedFormat(format!(
                "Unknown quality preset: {}",
                s
            ))),
        }
    }
}

/// One unit of work. Only the constructors can build one, so quality is
/// always clamped and the request cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRequest {
    input_path: PathBuf,
    output_path: PathBuf,
    mode: ProcessingMode,
    target_format: Option<String>,
    quality: u8,
    remove_metadata: bool,
}

impl ProcessingRequest {
    pub fn compress(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        quality: i64,
        remove_metadata: bool,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            mode: ProcessingMode::Compress,
            target_format: None,
            quality: clamp_quality(quality),
            remove_metadata,
        }
    }

    pub fn convert(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        target_format: impl Into<String>,
        quality: i64,
        remove_metadata: bool,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            mode: ProcessingMode::Convert,
            target_format: Some(target_format.into()),
            quality: clamp_quality(quality),
            remove_metadata,
        }
    }

    /// A compress request at the default quality, keeping metadata.
    pub fn with_defaults(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self::compress(input_path, output_path, DEFAULT_QUALITY as i64, false)
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Only meaningful for `Convert`; parsed case-insensitively when used.
    pub fn target_format(&self) -> Option<&str> {
        self.target_format.as_deref()
    }

    /// Always within `MIN_QUALITY..=MAX_QUALITY`.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn remove_metadata(&self) -> bool {
        self.remove_metadata
    }
}

/// Failure class of an unsuccessful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    Decode,
    Encode,
    Capability,
    UnsupportedFormat,
}

impl From<&ProcessingError> for FailureKind {
    fn from(err: &ProcessingError) -> Self {
        match err {
            ProcessingError::Decode { .. } | ProcessingError::FileNotFound(_) => {
                FailureKind::Decode
            }
            ProcessingError::AvifEncoderUnavailable => FailureKind::Capability,
            ProcessingError::UnsupportedFormat(_) | ProcessingError::MissingTargetFormat => {
                FailureKind::UnsupportedFormat
            }
            // anything that kept the output from being produced
            _ => FailureKind::Encode,
        }
    }
}

/// Outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    pub success: bool,
    pub message: String,
    pub original_size_bytes: u64,
    pub output_size_bytes: u64,
    /// Negative when the output grew.
    pub reduction_pct: f64,
    pub output_path: Option<PathBuf>,
    pub failure: Option<FailureKind>,
}

impl ProcessingResult {
    /// `action` leads the message, e.g. "Compressed" or "Converted to WEBP".
    pub fn written(action: &str, output_path: &Path, original_size: u64, output_size: u64) -> Self {
        let reduction_pct = calculate_reduction_pct(original_size, output_size);
        let message = format!(
            "{}: {:.2} MB → {:.2} MB ({:.1}% reduction)",
            action,
            original_size as f64 / BYTES_PER_MB,
            output_size as f64 / BYTES_PER_MB,
            reduction_pct
        );
        Self {
            success: true,
            message,
            original_size_bytes: original_size,
            output_size_bytes: output_size,
            reduction_pct,
            output_path: Some(output_path.to_path_buf()),
            failure: None,
        }
    }

    pub fn failed(err: &ProcessingError) -> Self {
        Self {
            success: false,
            message: format!("Error: {}", err),
            original_size_bytes: 0,
            output_size_bytes: 0,
            reduction_pct: 0.0,
            output_path: None,
            failure: Some(FailureKind::from(err)),
        }
    }
}

/// Dispatch a request to the compressor or the converter.
pub fn process(request: &ProcessingRequest, capabilities: &FormatCapabilities) -> ProcessingResult {
    match request.mode() {
        ProcessingMode::Compress => compressor::compress(request),
        ProcessingMode::Convert => converter::convert(request, capabilities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_constructors_clamp_quality() {
        let low = ProcessingRequest::compress("a.jpg", "out/a.jpg", -20, false);
        assert_eq!(low.quality(), 1);
        assert_eq!(low.mode(), ProcessingMode::Compress);
        assert!(low.target_format().is_none());

        let high = ProcessingRequest::convert("a.jpg", "out/a.jpg", "webp", 400, true);
        assert_eq!(high.quality(), 100);
        assert_eq!(high.target_format(), Some("webp"));
        assert!(high.remove_metadata());
    }

    #[test]
    fn test_default_request() {
        let request = ProcessingRequest::with_defaults("a.png", "b.png");
        assert_eq!(request.quality(), 85);
        assert!(!request.remove_metadata());
    }

    #[test]
    fn test_quality_presets() {
        assert_eq!(QualityPreset::from_str("web").unwrap().quality(), 75);
        assert_eq!(QualityPreset::from_str("Balanced").unwrap().quality(), 85);
        assert_eq!(QualityPreset::from_str("HIGH").unwrap().quality(), 95);
        assert!(QualityPreset::from_str("max").is_err());
    }

    #[test]
    fn test_written_result_message() {
        let result = ProcessingResult::written(
            "Compressed",
            Path::new("/out/a.jpg"),
            2 * 1024 * 1024,
            1024 * 1024,
        );
        assert!(result.success);
        assert_eq!(result.reduction_pct, 50.0);
        assert_eq!(result.message, "Compressed: 2.00 MB → 1.00 MB (50.0% reduction)");
        assert_eq!(result.output_path, Some(PathBuf::from("/out/a.jpg")));
    }

    #[test]
    fn test_growth_is_reported_negative() {
        let result =
            ProcessingResult::written("Converted to WEBP", Path::new("x.webp"), 1000, 1500);
        assert_eq!(result.reduction_pct, -50.0);
        assert!(result.message.contains("-50.0% reduction"));
    }

    #[test]
    fn test_failure_kinds() {
        let capability = ProcessingResult::failed(&ProcessingError::AvifEncoderUnavailable);
        assert!(!capability.success);
        assert_eq!(capability.reduction_pct, 0.0);
        assert_eq!(capability.failure, Some(FailureKind::Capability));
        assert!(capability.message.contains("AVIF encoder not installed"));

        let decode = ProcessingResult::failed(&ProcessingError::decode("x.jpg", "truncated"));
        assert_eq!(decode.failure, Some(FailureKind::Decode));

        let unsupported = ProcessingResult::failed(&ProcessingError::MissingTargetFormat);
        assert_eq!(unsupported.failure, Some(FailureKind::UnsupportedFormat));
    }
}
