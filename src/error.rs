use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Cannot encode {path:?}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("AVIF encoder not installed. Rebuild imgpress with the `avif` feature enabled")]
    AvifEncoderUnavailable,

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Convert mode requires a target format")]
    MissingTargetFormat,

    #[error("Existing file {path:?} is present but its metadata is unreadable: {source}")]
    ConflictRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output directory {0:?} does not exist and cannot be created")]
    OutputDirectoryUnavailable(PathBuf),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("No image files found in input path: {0}")]
    NoImageFilesFound(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ProcessingError {
    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ProcessingError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ProcessingError::Encode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProcessingError>;
