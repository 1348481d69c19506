//! Report configuration: where inputs live and how images are sized.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vlf_io::HttpTileSource;
use vlf_wizard::AssemblySettings;

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid configuration.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the CLI needs besides the answers themselves.
///
/// Missing keys in a config file take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory holding `templateVLF*.docx`.
    pub templates_dir: PathBuf,
    /// Directory holding the voltage reference images.
    pub assets_dir: PathBuf,
    /// Street tile server for urban sites, a `{z}/{x}/{y}` URL template.
    pub street_tiles_url: Option<String>,
    /// Satellite tile server for rural sites.
    pub satellite_tiles_url: Option<String>,
    /// Street tile pyramid. With a server it caches downloaded tiles,
    /// without one it is the only source.
    pub street_tiles_dir: Option<PathBuf>,
    /// Satellite tile pyramid, used like `street_tiles_dir`.
    pub satellite_tiles_dir: Option<PathBuf>,
    /// Per-request tile timeout in seconds.
    pub tile_timeout_secs: u64,
    /// Report destination: a directory or a file path.
    pub output: PathBuf,
    /// Map sizes and printed image widths.
    pub assembly: AssemblySettings,
}

impl ReportConfig {
    /// Default template directory.
    pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

    /// Default asset directory.
    pub const DEFAULT_ASSETS_DIR: &str = "static";

    /// Default report destination, the working directory.
    pub const DEFAULT_OUTPUT: &str = ".";

    /// Load a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(Self::DEFAULT_TEMPLATES_DIR),
            assets_dir: PathBuf::from(Self::DEFAULT_ASSETS_DIR),
            street_tiles_url: Some(HttpTileSource::OPENSTREETMAP.to_string()),
            satellite_tiles_url: Some(HttpTileSource::ESRI_WORLD_IMAGERY.to_string()),
            street_tiles_dir: None,
            satellite_tiles_dir: None,
            tile_timeout_secs: HttpTileSource::DEFAULT_TIMEOUT.as_secs(),
            output: PathBuf::from(Self::DEFAULT_OUTPUT),
            assembly: AssemblySettings::default(),
        }
    }
}
