//! Circle markers drawn with anti-aliasing.

use image::{Rgba, RgbaImage};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::types::MapError;

/// Fill color and size of a circle marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// RGB fill.
    pub color: [u8; 3],
    /// Radius in pixels.
    pub radius: f32,
}

impl MarkerStyle {
    /// Marker placed at the center of satellite maps.
    pub const SATELLITE_CENTER: Self = Self {
        color: [255, 0, 0],
        radius: 8.0,
    };
}

/// Draw a filled circle centred on (`cx`, `cy`) onto `image`.
///
/// # Errors
///
/// Returns [`MapError::InvalidRequest`] if the image has a zero dimension
/// or the radius is not positive.
pub fn draw_marker(image: &mut RgbaImage, cx: f32, cy: f32, style: MarkerStyle) -> Result<(), MapError> {
    if !(style.radius.is_finite() && style.radius > 0.0) {
        return Err(MapError::InvalidRequest(format!(
            "invalid marker radius {}",
            style.radius
        )));
    }
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| MapError::InvalidRequest(format!("cannot draw on a {width}x{height} image")))?;
    let circle = PathBuilder::from_circle(cx, cy, style.radius)
        .ok_or_else(|| MapError::InvalidRequest(format!("invalid marker radius {}", style.radius)))?;

    premultiply_into(image, pixmap.data_mut());

    let [r, g, b] = style.color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;
    pixmap.fill_path(&circle, &paint, FillRule::Winding, Transform::identity(), None);

    unpremultiply_from(pixmap.data(), image);
    Ok(())
}

fn premultiply_into(image: &RgbaImage, data: &mut [u8]) {
    for (pixel, out) in image.pixels().zip(data.chunks_exact_mut(4)) {
        let Rgba([r, g, b, a]) = *pixel;
        let scale = |c: u8| -> u8 {
            #[allow(clippy::cast_possible_truncation)]
            let v = (u16::from(c) * u16::from(a) / 255) as u8;
            v
        };
        out.copy_from_slice(&[scale(r), scale(g), scale(b), a]);
    }
}

#[allow(clippy::cast_possible_truncation)]
fn unpremultiply_from(data: &[u8], image: &mut RgbaImage) {
    for (pixel, px) in image.pixels_mut().zip(data.chunks_exact(4)) {
        let a = px[3];
        *pixel = if a == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            let r = u16::from(px[0]) * 255 / u16::from(a);
            let g = u16::from(px[1]) * 255 / u16::from(a);
            let b = u16::from(px[2]) * 255 / u16::from(a);
            Rgba([r as u8, g as u8, b as u8, a])
        };
    }
}
