//! Output path derivation shared by the conflict checker, the converter and
//! the batch orchestrator. Predicted and written paths must never diverge,
//! so every component derives them through these functions.

use crate::formats::{OutputSelection, TargetFormat};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Filename the output for `input` receives under `selection`.
pub fn output_filename(input: &Path, selection: OutputSelection) -> OsString {
    let basename = input.file_name().unwrap_or_else(|| input.as_os_str());
    match selection.target() {
        Some(target) => with_target_extension(Path::new(basename), target).into_os_string(),
        None => basename.to_os_string(),
    }
}

/// Full output path for `input` written into `output_dir`.
pub fn output_path_for(input: &Path, output_dir: &Path, selection: OutputSelection) -> PathBuf {
    output_dir.join(output_filename(input, selection))
}

/// Replaces whatever extension `path` carries with the target's extension.
/// The caller-supplied extension is never trusted.
pub fn with_target_extension(path: &Path, target: TargetFormat) -> PathBuf {
    path.with_extension(target.extension())
}

/// Path with `_n` appended to the file stem, before the extension.
pub fn numbered_path(path: &Path, n: u32) -> PathBuf {
    let stem = path
        .file_stem()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default();
    let filename = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(filename)
}

/// First `stem_N.ext` (N starting at 1) for which `is_taken` is false.
pub fn auto_rename<F>(path: &Path, mut is_taken: F) -> PathBuf
where
    F: FnMut(&Path) -> bool,
{
    let mut n = 1;
    loop {
        let candidate = numbered_path(path, n);
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
