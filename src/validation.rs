use crate::error::{ProcessingError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Validate that an input path names an existing regular file
pub fn validate_input_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ProcessingError::FileNotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(ProcessingError::UnsupportedFormat(format!(
            "Input path is not a file: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Create the output directory if needed and return its canonical form.
///
/// This is the one configuration check that aborts a batch: it runs before
/// any input is read or any output written.
pub fn prepare_output_dir(path: &Path) -> Result<PathBuf> {
    let unavailable = || ProcessingError::OutputDirectoryUnavailable(path.to_path_buf());

    fs::create_dir_all(path).map_err(|_| unavailable())?;
    if !path.is_dir() {
        return Err(unavailable());
    }

    path.canonicalize().map_err(|_| unavailable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_validate_input_path_not_found() {
        let path = Path::new("nonexistent.jpg");
        let result = validate_input_path(path);
        assert!(matches!(result, Err(ProcessingError::FileNotFound(_))));
    }

    #[test]
    fn test_validate_input_path_rejects_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = validate_input_path(temp_dir.path());
        assert!(matches!(result, Err(ProcessingError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_validate_input_path_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("test.jpg");
        let mut file = File::create(&test_file).unwrap();
        file.write_all(b"fake image data").unwrap();

        assert!(validate_input_path(&test_file).is_ok());
    }

    #[test]
    fn test_prepare_output_dir_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");

        let prepared = prepare_output_dir(&nested).unwrap();

        assert!(nested.is_dir());
        assert!(prepared.is_absolute());
    }

    #[test]
    fn test_prepare_output_dir_fails_on_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        File::create(&blocker).unwrap();

        let result = prepare_output_dir(&blocker.join("out"));
        assert!(matches!(
            result,
            Err(ProcessingError::OutputDirectoryUnavailable(_))
        ));
    }
}
