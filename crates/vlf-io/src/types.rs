//! Error type for filesystem operations.

use std::path::PathBuf;

/// Errors from reading inputs or writing the report.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// A file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON file could not be parsed.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// Path of the JSON file.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// An upload is not a PNG or JPEG file.
    #[error("{0} is not a .png, .jpg or .jpeg file")]
    UnsupportedUpload(PathBuf),

    /// An upload has a photo extension but its contents do not decode.
    #[error("{path} is not a readable image: {source}")]
    NotAnImage {
        /// Upload path.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The HTTP client could not be built.
    #[error("failed to set up the tile client: {0}")]
    Client(#[source] reqwest::Error),

    /// A tile request failed.
    #[error("tile request {url} failed: {source}")]
    Http {
        /// Requested URL.
        url: String,
        /// Transport or status error.
        #[source]
        source: reqwest::Error,
    },
}

impl IoError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
