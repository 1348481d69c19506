//! Tile lookup and compositing.

use image::{Rgba, RgbaImage, imageops};

use crate::projection::TILE_SIZE;
use crate::types::{MapError, TileId, TileSourceError};

/// Where raster tiles come from.
pub trait TileSource {
    /// Encoded bytes (PNG or JPEG) of tile `id`, `Ok(None)` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the tile exists but cannot be read.
    fn fetch(&self, id: TileId) -> Result<Option<Vec<u8>>, TileSourceError>;
}

impl<T: TileSource + ?Sized> TileSource for &T {
    fn fetch(&self, id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
        (**self).fetch(id)
    }
}

/// A source with no tiles. Maps render as background plus marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTiles;

impl TileSource for NoTiles {
    fn fetch(&self, _id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
        Ok(None)
    }
}

/// A rectangle of global pixels at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    /// Global x of the left edge.
    pub left: i64,
    /// Global y of the top edge.
    pub top: i64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Assemble the image covering `window` at `zoom` from `source`.
///
/// Columns wrap around the antimeridian. Rows outside the world and
/// tiles the source does not have are left as `background`.
///
/// # Errors
///
/// Returns [`MapError::Tile`] if a tile cannot be read or decoded.
pub fn compose(
    source: &impl TileSource,
    zoom: u8,
    window: PixelWindow,
    background: Rgba<u8>,
) -> Result<RgbaImage, MapError> {
    let mut out = RgbaImage::from_pixel(window.width, window.height, background);
    if window.width == 0 || window.height == 0 {
        return Ok(out);
    }

    let size = i64::from(TILE_SIZE);
    let tiles_per_axis = 1_i64 << zoom.min(30);
    let first_col = window.left.div_euclid(size);
    let last_col = (window.left + i64::from(window.width) - 1).div_euclid(size);
    let first_row = window.top.div_euclid(size).max(0);
    let last_row = (window.top + i64::from(window.height) - 1)
        .div_euclid(size)
        .min(tiles_per_axis - 1);

    let mut missing = 0_usize;
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            let (Ok(x), Ok(y)) = (
                u32::try_from(col.rem_euclid(tiles_per_axis)),
                u32::try_from(row),
            ) else {
                continue;
            };
            let id = TileId { zoom, x, y };
            let Some(bytes) = source
                .fetch(id)
                .map_err(|source| MapError::Tile { id, source })?
            else {
                missing += 1;
                continue;
            };
            let tile = decode_tile(id, &bytes)?;
            imageops::overlay(&mut out, &tile, col * size - window.left, row * size - window.top);
        }
    }

    if missing > 0 {
        tracing::debug!(zoom, missing, "tiles absent; background shown");
    }
    Ok(out)
}

fn decode_tile(id: TileId, bytes: &[u8]) -> Result<RgbaImage, MapError> {
    let tile = image::load_from_memory(bytes)
        .map_err(|err| MapError::Tile {
            id,
            source: Box::new(err),
        })?
        .to_rgba8();
    if tile.dimensions() == (TILE_SIZE, TILE_SIZE) {
        Ok(tile)
    } else {
        Ok(imageops::resize(
            &tile,
            TILE_SIZE,
            TILE_SIZE,
            imageops::FilterType::Triangle,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::io::Cursor;

    use super::*;

    /// Serves solid tiles whose red channel encodes the column.
    struct Solid {
        requested: RefCell<Vec<TileId>>,
    }

    impl TileSource for Solid {
        fn fetch(&self, id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
            self.requested.borrow_mut().push(id);
            #[allow(clippy::cast_possible_truncation)]
            let tile = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([id.x as u8, 0, 0, 255]));
            let mut bytes = Vec::new();
            tile.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
            Ok(Some(bytes))
        }
    }

    struct Broken;

    impl TileSource for Broken {
        fn fetch(&self, _id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
            Ok(Some(b"not an image".to_vec()))
        }
    }

    #[test]
    fn composes_requested_size() {
        let source = Solid {
            requested: RefCell::new(Vec::new()),
        };
        let window = PixelWindow {
            left: 300,
            top: 10,
            width: 600,
            height: 400,
        };
        let image = compose(&source, 3, window, Rgba([0, 0, 0, 255])).unwrap();
        assert_eq!(image.dimensions(), (600, 400));
        // columns 1..=3, rows 0..=1
        assert_eq!(source.requested.borrow().len(), 6);
        assert_eq!(image.get_pixel(0, 0)[0], 1);
        assert_eq!(image.get_pixel(599, 0)[0], 3);
    }

    #[test]
    fn columns_wrap_at_antimeridian() {
        let source = Solid {
            requested: RefCell::new(Vec::new()),
        };
        let window = PixelWindow {
            left: -10,
            top: 0,
            width: 20,
            height: 20,
        };
        let image = compose(&source, 1, window, Rgba([0, 0, 0, 255])).unwrap();
        assert_eq!(image.get_pixel(0, 0)[0], 1);
        assert_eq!(image.get_pixel(19, 0)[0], 0);
    }

    #[test]
    fn rows_outside_world_keep_background() {
        let window = PixelWindow {
            left: 0,
            top: -50,
            width: 10,
            height: 100,
        };
        let source = Solid {
            requested: RefCell::new(Vec::new()),
        };
        let image = compose(&source, 0, window, Rgba([9, 9, 9, 255])).unwrap();
        assert_eq!(image.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));
        assert_eq!(image.get_pixel(0, 99)[3], 255);
        assert_eq!(source.requested.borrow().len(), 1);
    }

    #[test]
    fn missing_tiles_leave_background() {
        let window = PixelWindow {
            left: 0,
            top: 0,
            width: 64,
            height: 64,
        };
        let image = compose(&NoTiles, 5, window, Rgba([1, 2, 3, 255])).unwrap();
        assert!(image.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn undecodable_tile_is_an_error() {
        let window = PixelWindow {
            left: 0,
            top: 0,
            width: 8,
            height: 8,
        };
        let err = compose(&Broken, 2, window, Rgba([0, 0, 0, 255])).unwrap_err();
        assert!(matches!(err, MapError::Tile { id, .. } if id == (TileId { zoom: 2, x: 0, y: 0 })));
    }
}
