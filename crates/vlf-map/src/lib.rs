//! vlf-map: location maps for VLF reports (sans-IO).
//!
//! Projects coordinates to Web-Mercator, composites XYZ raster tiles from
//! a [`TileSource`], draws the site marker and encodes PNG. Tiles are
//! supplied by the caller; `vlf-io` reads them from a directory pyramid.

pub mod marker;
pub mod projection;
pub mod render;
pub mod tiles;
pub mod types;

pub use marker::{MarkerStyle, draw_marker};
pub use render::{SatelliteRenderer, StreetMapRenderer, encode_png};
pub use tiles::{NoTiles, PixelWindow, TileSource, compose};
pub use types::{MapError, TileId, TileSourceError};
