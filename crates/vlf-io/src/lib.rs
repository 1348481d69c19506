//! vlf-io: filesystem collaborators for the report wizard.
//!
//! Directory-backed implementations of the `vlf-wizard` and `vlf-map`
//! collaborator traits, a tile server client, plus loading of answers and
//! photo uploads and writing of the finished report.

pub mod answers;
pub mod assets;
pub mod download;
pub mod templates;
pub mod tiles;
pub mod types;
pub mod uploads;

pub use answers::load_answers;
pub use assets::DirectoryAssetStore;
pub use download::write_download;
pub use templates::{DirectoryTemplateStore, TEMPLATE_EXTENSION};
pub use tiles::{DirectoryTileSource, HttpTileSource};
pub use types::IoError;
pub use uploads::{UPLOAD_EXTENSIONS, load_upload, scan_uploads};

use std::io;
use std::path::Path;

/// Read `path`, `Ok(None)` if it does not exist.
pub(crate) fn read_optional(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}
