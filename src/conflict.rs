//! Output collision detection
//!
//! Predicts where each input will be written and reports the ones whose
//! destination already exists, before anything is overwritten. This is a
//! read-only pass over the filesystem.

use crate::error::ProcessingError;
use crate::formats::OutputSelection;
use crate::paths::{output_filename, output_path_for};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// An input whose predicted output path already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    pub input_path: PathBuf,
    pub predicted_output_path: PathBuf,
    pub output_filename: String,
    pub existing_size_bytes: u64,
    pub existing_modified_time: SystemTime,
    /// False when the file exists but its size/mtime could not be read; the
    /// size and time fields then hold 0 and the epoch.
    pub metadata_readable: bool,
}

/// Check for output conflicts before processing starts.
///
/// Records are returned in input order, without deduplication.
pub fn check_conflicts<P: AsRef<Path>>(
    input_paths: &[P],
    output_dir: &Path,
    selection: OutputSelection,
) -> Vec<ConflictRecord> {
    input_paths
        .iter()
        .filter_map(|input| check_one(input.as_ref(), output_dir, selection))
        .collect()
}

fn check_one(
    input: &Path,
    output_dir: &Path,
    selection: OutputSelection,
) -> Option<ConflictRecord> {
    let predicted = output_path_for(input, output_dir, selection);
    if !exists(&predicted) {
        return None;
    }

    let (size, modified, readable) = match read_existing(&predicted) {
        Ok((size, modified)) => (size, modified, true),
        Err(e) => {
            warn!(error = %e, "conflict metadata unreadable, reporting degraded conflict");
            (0, UNIX_EPOCH, false)
        }
    };
    debug!(input = ?input, output = ?predicted, size, "output conflict");

    Some(ConflictRecord {
        input_path: input.to_path_buf(),
        output_filename: output_filename(input, selection)
            .to_string_lossy()
            .into_owned(),
        predicted_output_path: predicted,
        existing_size_bytes: size,
        existing_modified_time: modified,
        metadata_readable: readable,
    })
}

/// Existence that does not depend on being able to stat the file: a path
/// whose metadata is unreadable still blocks an overwrite.
pub(crate) fn exists(path: &Path) -> bool {
    path.try_exists().unwrap_or(false) || fs::symlink_metadata(path).is_ok()
}

fn read_existing(path: &Path) -> Result<(u64, SystemTime), ProcessingError> {
    let to_conflict_error = |source: std::io::Error| ProcessingError::ConflictRead {
        path: path.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(path).map_err(to_conflict_error)?;
    let modified = metadata.modified().map_err(to_conflict_error)?;
    Ok((metadata.len(), modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_conflicts_in_empty_output_dir() {
        let out = TempDir::new().unwrap();
        let inputs = vec![PathBuf::from("/in/a.jpg"), PathBuf::from("/in/b.png")];
        assert!(check_conflicts(&inputs, out.path(), OutputSelection::KeepOriginal).is_empty());
    }

    #[test]
    fn test_conflict_reports_existing_size() {
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("b.webp"), vec![0u8; 2048]).unwrap();
        let inputs = vec![PathBuf::from("/in/a.jpg"), PathBuf::from("/in/b.png")];

        let conflicts = check_conflicts(&inputs, out.path(), OutputSelection::WebP);

        assert_eq!(conflicts.len(), 1);
        let record = &conflicts[0];
        assert_eq!(record.input_path, PathBuf::from("/in/b.png"));
        assert_eq!(record.predicted_output_path, out.path().join("b.webp"));
        assert_eq!(record.output_filename, "b.webp");
        assert_eq!(record.existing_size_bytes, 2048);
        assert!(record.metadata_readable);
        assert!(record.existing_modified_time > UNIX_EPOCH);
    }

    #[test]
    fn test_selection_changes_predicted_name() {
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("photo.jpg"), b"x").unwrap();
        let inputs = vec![PathBuf::from("/in/photo.jpg")];

        assert_eq!(
            check_conflicts(&inputs, out.path(), OutputSelection::KeepOriginal).len(),
            1
        );
        assert!(check_conflicts(&inputs, out.path(), OutputSelection::Avif).is_empty());
        assert_eq!(
            check_conflicts(&inputs, out.path(), OutputSelection::from_label("Bogus")).len(),
            1
        );
    }

    #[test]
    fn test_conflicts_keep_input_order_and_duplicates() {
        let out = TempDir::new().unwrap();
        fs::write(out.path().join("x.jpg"), b"x").unwrap();
        fs::write(out.path().join("y.jpg"), b"y").unwrap();
        let inputs = vec![
            PathBuf::from("/in/y.jpg"),
            PathBuf::from("/in/x.jpg"),
            PathBuf::from("/other/y.jpg"),
        ];

        let conflicts = check_conflicts(&inputs, out.path(), OutputSelection::KeepOriginal);
        let order: Vec<_> = conflicts.iter().map(|c| c.input_path.clone()).collect();
        assert_eq!(order, inputs);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_existing_output_gives_degraded_record() {
        let out = TempDir::new().unwrap();
        std::os::unix::fs::symlink("/nonexistent/target.webp", out.path().join("lost.webp"))
            .unwrap();

        let conflicts = check_conflicts(
            &[PathBuf::from("/in/lost.png")],
            out.path(),
            OutputSelection::WebP,
        );

        assert_eq!(conflicts.len(), 1);
        let record = &conflicts[0];
        assert_eq!(record.predicted_output_path, out.path().join("lost.webp"));
        assert_eq!(record.existing_size_bytes, 0);
        assert_eq!(record.existing_modified_time, UNIX_EPOCH);
        assert!(!record.metadata_readable);
    }
}
