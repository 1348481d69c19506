//! Saving the finished report.

use std::path::{Path, PathBuf};

use vlf_wizard::ReportDownload;

use crate::types::IoError;

/// Write `download` to `dest`.
///
/// An existing directory receives the report under its suggested file
/// name; any other path is used as the file path. Returns the path written.
///
/// # Errors
///
/// Returns [`IoError::Write`] if the file cannot be written.
pub fn write_download(download: &ReportDownload, dest: &Path) -> Result<PathBuf, IoError> {
    let path = if dest.is_dir() {
        dest.join(&download.file_name)
    } else {
        dest.to_path_buf()
    };
    std::fs::write(&path, &download.bytes).map_err(|source| IoError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = download.bytes.len(), "report written");
    Ok(path)
}
