pub mod batch;
pub mod codec;
pub mod compressor;
pub mod conflict;
pub mod constants;
pub mod converter;
pub mod error;
pub mod formats;
pub mod info;
pub mod logger;
pub mod metadata;
pub mod paths;
pub mod processing;
pub mod utils;
pub mod validation;

pub use batch::{
    collect_image_files, collect_inputs, BatchConfig, BatchProcessor, BatchReport,
    CancellationToken, ConflictPolicy, ConflictStrategy, FileOutcome, FileReport, PlannedFile,
};
pub use compressor::compress;
pub use conflict::{check_conflicts, ConflictRecord};
pub use converter::convert;
pub use error::{ProcessingError, Result};
pub use formats::{FormatCapabilities, MetadataSupport, NativeFormat, OutputSelection, TargetFormat};
pub use metadata::{get_exif_info, has_exif_data, strip_metadata, ExifSnapshot, MetadataSnapshot};
pub use processing::{
    process, FailureKind, ProcessingMode, ProcessingRequest, ProcessingResult, QualityPreset,
};
pub use utils::{calculate_reduction_pct, clamp_quality, format_file_size, format_modified_time};
