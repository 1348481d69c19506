//! Shared types for map rendering.

use std::fmt;

/// Boxed error returned by tile sources.
pub type TileSourceError = Box<dyn std::error::Error + Send + Sync>;

/// Address of one raster tile in the XYZ scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    /// Zoom level.
    pub zoom: u8,
    /// Column, 0 at the antimeridian going east.
    pub x: u32,
    /// Row, 0 at the northern edge.
    pub y: u32,
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Errors that can occur while rendering a map.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The request cannot be rendered as given.
    #[error("invalid map request: {0}")]
    InvalidRequest(String),

    /// A tile exists but could not be read or decoded.
    #[error("tile {id} unusable: {source}")]
    Tile {
        /// Offending tile.
        id: TileId,
        /// Underlying failure.
        #[source]
        source: TileSourceError,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_id_display_is_zxy() {
        let id = TileId {
            zoom: 17,
            x: 38_357,
            y: 63_647,
        };
        assert_eq!(id.to_string(), "17/38357/63647");
    }
}
