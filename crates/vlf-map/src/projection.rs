//! Spherical Web-Mercator (EPSG:3857) projection and tile pixel space.
//!
//! Three coordinate spaces appear here:
//!
//! - geographic degrees (`x` = longitude, `y` = latitude),
//! - projected meters (EPSG:3857, `y` grows north),
//! - global pixels at a zoom level (`y` grows south, origin at the
//!   north-west corner of the world, `tile_size * 2^zoom` pixels across).

use std::f64::consts::{FRAC_PI_4, PI};

use geo::{Coord, MapCoords, Rect};

/// Sphere radius used by EPSG:3857, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude beyond which Web-Mercator is undefined (the square world edge).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Half the projected world width in meters.
pub const HALF_WORLD_M: f64 = PI * EARTH_RADIUS_M;

/// Side length of a standard raster tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Project degrees to EPSG:3857 meters.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped to it.
#[must_use]
pub fn to_web_mercator(lonlat: Coord<f64>) -> Coord<f64> {
    let lat = lonlat.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: EARTH_RADIUS_M * lonlat.x.to_radians(),
        y: EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Inverse of [`to_web_mercator`].
#[must_use]
pub fn from_web_mercator(meters: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (meters.x / EARTH_RADIUS_M).to_degrees(),
        y: (2.0 * (meters.y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees(),
    }
}

/// Width of the whole world in pixels at `zoom`.
#[must_use]
pub fn world_size_px(zoom: u8) -> f64 {
    f64::from(TILE_SIZE) * 2_f64.powi(i32::from(zoom))
}

/// Convert projected meters to global pixels at `zoom`.
#[must_use]
pub fn meters_to_pixels(meters: Coord<f64>, zoom: u8) -> Coord<f64> {
    let scale = world_size_px(zoom) / (2.0 * HALF_WORLD_M);
    Coord {
        x: (meters.x + HALF_WORLD_M) * scale,
        y: (HALF_WORLD_M - meters.y) * scale,
    }
}

/// Convert degrees straight to global pixels at `zoom`.
#[must_use]
pub fn lonlat_to_pixels(lonlat: Coord<f64>, zoom: u8) -> Coord<f64> {
    meters_to_pixels(to_web_mercator(lonlat), zoom)
}

/// A box of `half_width` by `half_height` meters either side of `center`.
#[must_use]
pub fn buffered_bbox(center: Coord<f64>, half_width: f64, half_height: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: center.x - half_width,
            y: center.y - half_height,
        },
        Coord {
            x: center.x + half_width,
            y: center.y + half_height,
        },
    )
}

/// Map a projected box into global pixels at `zoom`.
///
/// The result is normalized, so `min().y` is the northern edge.
#[must_use]
pub fn bbox_to_pixels(bbox: Rect<f64>, zoom: u8) -> Rect<f64> {
    bbox.map_coords(|c| meters_to_pixels(c, zoom))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn origin_projects_to_origin() {
        let m = to_web_mercator(Coord { x: 0.0, y: 0.0 });
        assert!(close(m.x, 0.0, 1e-9));
        assert!(close(m.y, 0.0, 1e-9));
    }

    #[test]
    fn antimeridian_is_half_world() {
        let m = to_web_mercator(Coord { x: 180.0, y: 0.0 });
        assert!(close(m.x, HALF_WORLD_M, 1e-6));
    }

    #[test]
    fn bogota_matches_reference_values() {
        // EPSG:3857 of (-74.0817, 4.6097)
        let m = to_web_mercator(Coord {
            x: -74.0817,
            y: 4.6097,
        });
        assert!(close(m.x, -8_246_737.1, 0.5), "x = {}", m.x);
        assert!(close(m.y, 513_703.9, 0.5), "y = {}", m.y);
    }

    #[test]
    fn polar_latitudes_are_clamped() {
        let north = to_web_mercator(Coord { x: 0.0, y: 89.9 });
        assert!(close(north.y, HALF_WORLD_M, 1e-3));
    }

    #[test]
    fn world_corners_in_pixels() {
        let nw = meters_to_pixels(
            Coord {
                x: -HALF_WORLD_M,
                y: HALF_WORLD_M,
            },
            1,
        );
        assert!(close(nw.x, 0.0, 1e-9));
        assert!(close(nw.y, 0.0, 1e-9));
        let se = meters_to_pixels(
            Coord {
                x: HALF_WORLD_M,
                y: -HALF_WORLD_M,
            },
            1,
        );
        assert!(close(se.x, 512.0, 1e-9));
        assert!(close(se.y, 512.0, 1e-9));
    }

    #[test]
    fn bbox_in_pixels_keeps_north_at_top() {
        let center = to_web_mercator(Coord { x: 10.0, y: 45.0 });
        let bbox = bbox_to_pixels(buffered_bbox(center, 400.0, 300.0), 17);
        let mid = lonlat_to_pixels(Coord { x: 10.0, y: 45.0 }, 17);
        assert!(bbox.min().y < mid.y && mid.y < bbox.max().y);
        assert!(close(bbox.center().x, mid.x, 1e-6));
        assert!(close(bbox.width() / bbox.height(), 4.0 / 3.0, 1e-9));
    }
}
