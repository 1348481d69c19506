//! Map renderers plugged into report assembly.
//!
//! [`StreetMapRenderer`] answers marker-map requests for urban sites and
//! [`SatelliteRenderer`] answers satellite requests for rural sites. Both
//! composite tiles from a [`TileSource`] and encode the result as PNG.

use geo::Coord;
use image::{ImageEncoder, Rgba, RgbaImage, imageops};
use vlf_wizard::{CollaboratorError, MarkerMap, MarkerMapRequest, SatelliteMap, SatelliteMapRequest};

use crate::marker::{MarkerStyle, draw_marker};
use crate::projection::{bbox_to_pixels, buffered_bbox, lonlat_to_pixels, to_web_mercator};
use crate::tiles::{PixelWindow, TileSource, compose};
use crate::types::MapError;

/// Largest accepted output side, in pixels.
pub const MAX_OUTPUT_SIDE: u32 = 4096;

/// Largest tile window composited before resizing, in pixels per side.
pub const MAX_SOURCE_SIDE: u32 = 8192;

/// Highest zoom level of XYZ tile pyramids.
pub const MAX_ZOOM: u8 = 22;

/// Land color of default street styles.
pub const STREET_BACKGROUND: Rgba<u8> = Rgba([242, 239, 233, 255]);

/// Neutral dark fill shown where satellite imagery is missing.
pub const SATELLITE_BACKGROUND: Rgba<u8> = Rgba([48, 48, 48, 255]);

fn check_common(lon: f64, lat: f64, width: u32, height: u32, zoom: u8) -> Result<(), MapError> {
    if !(lon.is_finite() && lat.is_finite()) {
        return Err(MapError::InvalidRequest(format!("non-finite position ({lon}, {lat})")));
    }
    if width == 0 || height == 0 || width > MAX_OUTPUT_SIDE || height > MAX_OUTPUT_SIDE {
        return Err(MapError::InvalidRequest(format!(
            "output size {width}x{height} outside 1..={MAX_OUTPUT_SIDE}"
        )));
    }
    if zoom > MAX_ZOOM {
        return Err(MapError::InvalidRequest(format!("zoom {zoom} above {MAX_ZOOM}")));
    }
    Ok(())
}

/// Encode an RGBA image as PNG bytes.
///
/// # Errors
///
/// Returns [`MapError::Encode`] if encoding fails.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, MapError> {
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}

/// Street map centred on a circle marker.
#[derive(Debug, Clone)]
pub struct StreetMapRenderer<S> {
    tiles: S,
    background: Rgba<u8>,
}

impl<S: TileSource> StreetMapRenderer<S> {
    /// Renderer reading tiles from `tiles`.
    #[must_use]
    pub const fn new(tiles: S) -> Self {
        Self {
            tiles,
            background: STREET_BACKGROUND,
        }
    }

    /// Replace the fill shown where tiles are missing.
    #[must_use]
    pub const fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    /// Render `request` into an RGBA image.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] for invalid requests or unusable tiles.
    #[allow(clippy::cast_possible_truncation)]
    pub fn render_image(&self, request: &MarkerMapRequest) -> Result<RgbaImage, MapError> {
        check_common(request.lon, request.lat, request.width, request.height, request.zoom)?;
        let center = lonlat_to_pixels(
            Coord {
                x: request.lon,
                y: request.lat,
            },
            request.zoom,
        );
        let left = (center.x - f64::from(request.width) / 2.0).round();
        let top = (center.y - f64::from(request.height) / 2.0).round();
        let window = PixelWindow {
            left: left as i64,
            top: top as i64,
            width: request.width,
            height: request.height,
        };

        let mut image = compose(&self.tiles, request.zoom, window, self.background)?;
        let style = MarkerStyle {
            color: request.color,
            radius: request.radius,
        };
        draw_marker(&mut image, (center.x - left) as f32, (center.y - top) as f32, style)?;
        Ok(image)
    }
}

impl<S: TileSource> MarkerMap for StreetMapRenderer<S> {
    fn render(&self, request: &MarkerMapRequest) -> Result<Vec<u8>, CollaboratorError> {
        let image = self.render_image(request).map_err(CollaboratorError::new)?;
        encode_png(&image).map_err(CollaboratorError::new)
    }
}

/// Satellite basemap around a point.
#[derive(Debug, Clone)]
pub struct SatelliteRenderer<S> {
    tiles: S,
    background: Rgba<u8>,
    marker: Option<MarkerStyle>,
}

impl<S: TileSource> SatelliteRenderer<S> {
    /// Renderer reading imagery tiles from `tiles`.
    #[must_use]
    pub const fn new(tiles: S) -> Self {
        Self {
            tiles,
            background: SATELLITE_BACKGROUND,
            marker: Some(MarkerStyle::SATELLITE_CENTER),
        }
    }

    /// Replace the fill shown where tiles are missing.
    #[must_use]
    pub const fn with_background(mut self, background: Rgba<u8>) -> Self {
        self.background = background;
        self
    }

    /// Change or drop (`None`) the center marker.
    #[must_use]
    pub const fn with_marker(mut self, marker: Option<MarkerStyle>) -> Self {
        self.marker = marker;
        self
    }

    /// Render `request` into an RGBA image.
    ///
    /// The covered area is `2 * buffer_m` meters tall; its width follows
    /// the output aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] for invalid requests or unusable tiles.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_image(&self, request: &SatelliteMapRequest) -> Result<RgbaImage, MapError> {
        check_common(request.lon, request.lat, request.width, request.height, request.zoom)?;
        if !(request.buffer_m.is_finite() && request.buffer_m > 0.0) {
            return Err(MapError::InvalidRequest(format!(
                "buffer {} m must be positive",
                request.buffer_m
            )));
        }

        let center = to_web_mercator(Coord {
            x: request.lon,
            y: request.lat,
        });
        let half_height = request.buffer_m;
        let half_width = half_height * f64::from(request.width) / f64::from(request.height);
        let bbox = bbox_to_pixels(buffered_bbox(center, half_width, half_height), request.zoom);

        let left = bbox.min().x.floor();
        let top = bbox.min().y.floor();
        let source_width = (bbox.max().x.ceil() - left).max(1.0);
        let source_height = (bbox.max().y.ceil() - top).max(1.0);
        if source_width > f64::from(MAX_SOURCE_SIDE) || source_height > f64::from(MAX_SOURCE_SIDE) {
            return Err(MapError::InvalidRequest(format!(
                "{} m around the point needs {source_width}x{source_height} px at zoom {}",
                request.buffer_m, request.zoom
            )));
        }
        let window = PixelWindow {
            left: left as i64,
            top: top as i64,
            width: source_width as u32,
            height: source_height as u32,
        };
        tracing::debug!(?window, zoom = request.zoom, "compositing satellite tiles");

        let mosaic = compose(&self.tiles, request.zoom, window, self.background)?;
        let mut image = imageops::resize(
            &mosaic,
            request.width,
            request.height,
            imageops::FilterType::Triangle,
        );
        if let Some(style) = self.marker {
            let cx = f64::from(request.width) / 2.0;
            let cy = f64::from(request.height) / 2.0;
            draw_marker(&mut image, cx as f32, cy as f32, style)?;
        }
        Ok(image)
    }
}

impl<S: TileSource> SatelliteMap for SatelliteRenderer<S> {
    fn render(&self, request: &SatelliteMapRequest) -> Result<Vec<u8>, CollaboratorError> {
        let image = self.render_image(request).map_err(CollaboratorError::new)?;
        encode_png(&image).map_err(CollaboratorError::new)
    }
}
