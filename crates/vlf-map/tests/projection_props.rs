#![allow(clippy::unwrap_used)]

use geo::Coord;
use image::{Rgba, RgbaImage};
use proptest::prelude::*;
use vlf_map::projection::{MAX_LATITUDE, from_web_mercator, lonlat_to_pixels, to_web_mercator, world_size_px};
use vlf_map::{NoTiles, PixelWindow, TileId, TileSource, TileSourceError, compose};

struct Checker {
    dark: Vec<u8>,
    light: Vec<u8>,
}

impl Checker {
    fn new() -> Self {
        let solid = |shade| {
            vlf_map::encode_png(&RgbaImage::from_pixel(256, 256, Rgba([shade, shade, shade, 255])))
                .unwrap()
        };
        Self {
            dark: solid(0),
            light: solid(255),
        }
    }
}

impl TileSource for Checker {
    fn fetch(&self, id: TileId) -> Result<Option<Vec<u8>>, TileSourceError> {
        let tile = if (id.x + id.y) % 2 == 0 { &self.dark } else { &self.light };
        Ok(Some(tile.clone()))
    }
}

proptest! {
    #[test]
    fn mercator_round_trips(lon in -180.0f64..180.0, lat in -MAX_LATITUDE..MAX_LATITUDE) {
        let back = from_web_mercator(to_web_mercator(Coord { x: lon, y: lat }));
        prop_assert!((back.x - lon).abs() < 1e-9, "lon {} -> {}", lon, back.x);
        prop_assert!((back.y - lat).abs() < 1e-9, "lat {} -> {}", lat, back.y);
    }

    #[test]
    fn pixels_stay_inside_the_world(
        lon in -180.0f64..180.0,
        lat in -MAX_LATITUDE..MAX_LATITUDE,
        zoom in 0u8..=20,
    ) {
        let p = lonlat_to_pixels(Coord { x: lon, y: lat }, zoom);
        let world = world_size_px(zoom);
        prop_assert!((0.0..=world).contains(&p.x));
        prop_assert!((-1e-6..=world + 1e-6).contains(&p.y));
    }

    #[test]
    fn compose_yields_requested_size(
        left in -2000i64..2000,
        top in -500i64..2000,
        width in 1u32..700,
        height in 1u32..500,
    ) {
        let window = PixelWindow { left, top, width, height };
        let image = compose(&Checker::new(), 4, window, Rgba([0, 0, 0, 255])).unwrap();
        prop_assert_eq!(image.dimensions(), (width, height));
        let blank = compose(&NoTiles, 4, window, Rgba([0, 0, 0, 255])).unwrap();
        prop_assert_eq!(blank.dimensions(), (width, height));
    }
}
