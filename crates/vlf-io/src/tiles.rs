//! XYZ tiles: pyramids on disk (`{root}/{z}/{x}/{y}.png` or `.jpg`) and
//! tile servers addressed by a URL template, optionally cached in a
//! pyramid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::ImageFormat;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use vlf_map::{TileId, TileSource, TileSourceError};

use crate::read_optional;
use crate::types::IoError;

const TILE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// A local tile pyramid.
#[derive(Debug, Clone)]
pub struct DirectoryTileSource {
    root: PathBuf,
}

impl DirectoryTileSource {
    /// Source reading tiles below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pyramid root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` as tile `id`, creating directories as needed.
    ///
    /// JPEG tiles are stored as `.jpg`, everything else as `.png`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Write`] if the tile cannot be written.
    pub fn store(&self, id: TileId, bytes: &[u8]) -> Result<PathBuf, IoError> {
        let dir = self.root.join(id.zoom.to_string()).join(id.x.to_string());
        let extension = match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => "jpg",
            _ => "png",
        };
        let path = dir.join(format!("{}.{extension}", id.y));
        let write = |source| IoError::Write {
            path: path.clone(),
            source,
        };
        std::fs::create_dir_all(&dir).map_err(write)?;
        std::fs::write(&path, bytes).map_err(write)?;
        Ok(path)
    }

    fn candidates(&self, id: TileId) -> impl Iterator<Item = PathBuf> + '_ {
        let dir = self.root.join(id.zoom.to_string()).join(id.x.to_string());
        TILE_EXTENSIONS
            .into_iter()
            .map(move |ext| dir.join(format!("{}.{ext}", id.y)))
    }
}

impl TileSource for DirectoryTileSource {
    fn fetch(&self, id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
        for path in self.candidates(id) {
            match read_optional(&path) {
                Ok(Some(bytes)) => return Ok(Some(bytes)),
                Ok(None) => {}
                Err(source) => return Err(Box::new(IoError::read(path, source))),
            }
        }
        tracing::trace!(tile = %id, "tile not in pyramid");
        Ok(None)
    }
}

/// Tiles from a tile server.
///
/// The URL template carries `{z}`, `{x}` and `{y}` placeholders, e.g.
/// [`HttpTileSource::OPENSTREETMAP`]. A `404` is an absent tile; other
/// failures are errors. With a cache, tiles already on disk are not
/// requested again and fetched tiles are written back.
#[derive(Debug, Clone)]
pub struct HttpTileSource {
    client: Client,
    url_template: String,
    cache: Option<DirectoryTileSource>,
}

impl HttpTileSource {
    /// OpenStreetMap standard tiles.
    pub const OPENSTREETMAP: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

    /// Esri World Imagery. Note the `{y}/{x}` order.
    pub const ESRI_WORLD_IMAGERY: &str =
        "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Sent with every request; public tile servers require one.
    pub const USER_AGENT: &str = concat!("vlf/", env!("CARGO_PKG_VERSION"));

    /// Source requesting `url_template` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Client`] if the HTTP client cannot be built.
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, IoError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(Self::USER_AGENT)
            .build()
            .map_err(IoError::Client)?;
        Ok(Self::with_client(client, url_template))
    }

    /// Source requesting `url_template` through an existing client.
    #[must_use]
    pub fn with_client(client: Client, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
            cache: None,
        }
    }

    /// Keep fetched tiles in the pyramid under `dir`.
    #[must_use]
    pub fn with_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache = Some(DirectoryTileSource::new(dir));
        self
    }

    /// URL of tile `id`.
    #[must_use]
    pub fn url(&self, id: TileId) -> String {
        self.url_template
            .replace("{z}", &id.zoom.to_string())
            .replace("{x}", &id.x.to_string())
            .replace("{y}", &id.y.to_string())
    }

    fn download(&self, id: TileId) -> Result<Option<Vec<u8>>, IoError> {
        let url = self.url(id);
        let http = |source| IoError::Http {
            url: url.clone(),
            source,
        };
        let response = self.client.get(&url).send().map_err(http)?;
        if response.status() == StatusCode::NOT_FOUND {
            tracing::trace!(tile = %id, "tile not on server");
            return Ok(None);
        }
        let bytes = response.error_for_status().and_then(|r| r.bytes()).map_err(http)?;
        tracing::debug!(tile = %id, bytes = bytes.len(), "tile downloaded");
        Ok(Some(bytes.to_vec()))
    }
}

impl TileSource for HttpTileSource {
    fn fetch(&self, id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
        if let Some(cached) = self.cache.as_ref().map(|cache| cache.fetch(id)).transpose()?.flatten() {
            return Ok(Some(cached));
        }
        let Some(bytes) = self.download(id)? else {
            return Ok(None);
        };
        if let Some(cache) = &self.cache
            && let Err(err) = cache.store(id, &bytes)
        {
            tracing::warn!(tile = %id, %err, "tile not cached");
        }
        Ok(Some(bytes))
    }
}
