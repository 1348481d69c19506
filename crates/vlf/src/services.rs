//! Concrete collaborators wired from a [`ReportConfig`].

use std::path::Path;
use std::time::Duration;

use vlf_export::{DocxError, DocxRenderer};
use vlf_io::{DirectoryAssetStore, DirectoryTileSource, HttpTileSource, IoError};
use vlf_map::{NoTiles, SatelliteRenderer, StreetMapRenderer, TileId, TileSource, TileSourceError};
use vlf_wizard::{Collaborators, SystemClock};

use crate::config::ReportConfig;

/// Errors from wiring the collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ServicesError {
    /// The document renderer could not be built.
    #[error(transparent)]
    Renderer(#[from] DocxError),

    /// A tile client could not be built.
    #[error(transparent)]
    Tiles(#[from] IoError),
}

/// Where one map kind gets its tiles.
#[derive(Debug, Clone)]
pub enum Tiles {
    /// A tile server, cached in a pyramid when one is configured.
    Server(HttpTileSource),
    /// Tiles under a directory only.
    Directory(DirectoryTileSource),
    /// No imagery configured.
    Absent,
}

impl Tiles {
    fn from_config(
        kind: &str,
        url: Option<&str>,
        dir: Option<&Path>,
        timeout: Duration,
    ) -> Result<Self, IoError> {
        let tiles = match (url, dir) {
            (Some(url), dir) => {
                let server = HttpTileSource::new(url, timeout)?;
                Self::Server(match dir {
                    Some(dir) => server.with_cache(dir),
                    None => server,
                })
            }
            (None, Some(dir)) => Self::Directory(DirectoryTileSource::new(dir)),
            (None, None) => {
                tracing::info!(kind, "no tile source configured; maps show the marker only");
                Self::Absent
            }
        };
        tracing::debug!(kind, ?tiles, "tile source");
        Ok(tiles)
    }
}

impl TileSource for Tiles {
    fn fetch(&self, id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
        match self {
            Self::Server(source) => source.fetch(id),
            Self::Directory(source) => source.fetch(id),
            Self::Absent => NoTiles.fetch(id),
        }
    }
}

/// Owns every collaborator a report needs.
#[derive(Debug)]
pub struct Services {
    street: StreetMapRenderer<Tiles>,
    satellite: SatelliteRenderer<Tiles>,
    assets: DirectoryAssetStore,
    clock: SystemClock,
    renderer: DocxRenderer,
    config: ReportConfig,
}

impl Services {
    /// Build collaborators for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ServicesError`] if the document renderer or a tile
    /// client cannot be built.
    pub fn new(config: ReportConfig) -> Result<Self, ServicesError> {
        let timeout = Duration::from_secs(config.tile_timeout_secs);
        let street = Tiles::from_config(
            "street",
            config.street_tiles_url.as_deref(),
            config.street_tiles_dir.as_deref(),
            timeout,
        )?;
        let satellite = Tiles::from_config(
            "satellite",
            config.satellite_tiles_url.as_deref(),
            config.satellite_tiles_dir.as_deref(),
            timeout,
        )?;
        Ok(Self {
            street: StreetMapRenderer::new(street),
            satellite: SatelliteRenderer::new(satellite),
            assets: DirectoryAssetStore::new(&config.assets_dir),
            clock: SystemClock,
            renderer: DocxRenderer::new()?,
            config,
        })
    }

    /// Borrowed collaborators for context assembly.
    #[must_use]
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            marker_map: &self.street,
            satellite_map: &self.satellite,
            assets: &self.assets,
            clock: &self.clock,
            settings: self.config.assembly.clone(),
        }
    }

    /// The `.docx` renderer.
    #[must_use]
    pub const fn renderer(&self) -> &DocxRenderer {
        &self.renderer
    }

    /// Configuration the services were built from.
    #[must_use]
    pub const fn config(&self) -> &ReportConfig {
        &self.config
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_takes_precedence_and_directory_caches() {
        let timeout = HttpTileSource::DEFAULT_TIMEOUT;
        let dir = Path::new("cache");
        let tiles = Tiles::from_config("street", Some(HttpTileSource::OPENSTREETMAP), Some(dir), timeout);
        assert!(matches!(tiles.unwrap(), Tiles::Server(_)));

        let tiles = Tiles::from_config("street", None, Some(dir), timeout).unwrap();
        assert!(matches!(tiles, Tiles::Directory(ref d) if d.root() == dir));

        let tiles = Tiles::from_config("street", None, None, timeout).unwrap();
        assert!(matches!(tiles, Tiles::Absent));
    }

    #[test]
    fn offline_directory_without_tiles_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tiles = Tiles::Directory(DirectoryTileSource::new(dir.path()));
        let id = TileId { zoom: 1, x: 0, y: 0 };
        assert_eq!(tiles.fetch(id).unwrap(), None);
    }
}
