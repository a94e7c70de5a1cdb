//! Debug overlays highlighting a match on a copy of the source image.
//!
//! Overlays are outbound only; nothing in the matching code reads them back.

use crate::geometry::Rect;
use crate::trace::trace_error;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use image::{DynamicImage, Rgb, RgbImage, Rgba};
use imageproc::drawing::{draw_filled_rect_mut, Blend};
use imageproc::rect::Rect as PixelRect;
use std::path::Path;

/// Border thickness used when highlighting a match.
pub const DEFAULT_BORDER_THICKNESS: u32 = 6;

/// Alpha (out of 255) of the translucent highlight fill.
pub const DEFAULT_FILL_ALPHA: u8 = 70;

const HIGHLIGHT: [u8; 3] = [255, 0, 0];

/// Draws a red border of `thickness` pixels centered on the edges of `rect`.
///
/// Parts of the border outside the image are clipped.
pub fn draw_border(source: &RgbImage, rect: Rect, thickness: u32) -> RgbImage {
    let mut out = source.clone();
    let half = (thickness / 2) as i64;
    let extra = thickness as i64 - half;
    let (x0, y0) = (rect.x as i64, rect.y as i64);
    let (x1, y1) = (rect.right() as i64, rect.bottom() as i64);

    // Top, bottom, left, right bands.
    let bands = [
        (x0 - half, y0 - half, x1 + extra, y0 + extra),
        (x0 - half, y1 - half, x1 + extra, y1 + extra),
        (x0 - half, y0 - half, x0 + extra, y1 + extra),
        (x1 - half, y0 - half, x1 + extra, y1 + extra),
    ];
    for band in bands {
        if let Some(area) = pixel_rect(band) {
            draw_filled_rect_mut(&mut out, area, Rgb(HIGHLIGHT));
        }
    }
    out
}

/// Blends a translucent red fill over `rect`.
pub fn fill_area(source: &RgbImage, rect: Rect, alpha: u8) -> RgbImage {
    let area = pixel_rect((
        rect.x as i64,
        rect.y as i64,
        rect.right() as i64,
        rect.bottom() as i64,
    ));
    let Some(area) = area else {
        return source.clone();
    };
    let [r, g, b] = HIGHLIGHT;
    let mut canvas = Blend(DynamicImage::ImageRgb8(source.clone()).into_rgba8());
    draw_filled_rect_mut(&mut canvas, area, Rgba([r, g, b, alpha]));
    DynamicImage::ImageRgba8(canvas.0).into_rgb8()
}

/// Writes an overlay as PNG.
pub fn save_overlay<P: AsRef<Path>>(img: &RgbImage, path: P) -> ScreenMatchResult<()> {
    img.save_with_format(path.as_ref(), image::ImageFormat::Png)
        .map_err(|err| {
            trace_error!("cannot write highlighted image {:?}: {}", path.as_ref(), err);
            ScreenMatchError::ImageIo {
                reason: err.to_string(),
            }
        })
}

/// Drawing rectangle for the half-open span `(x0, y0)..(x1, y1)`; `None`
/// when it is empty or its coordinates overflow.
fn pixel_rect((x0, y0, x1, y1): (i64, i64, i64, i64)) -> Option<PixelRect> {
    let width = u32::try_from(x1 - x0).ok().filter(|&w| w > 0)?;
    let height = u32::try_from(y1 - y0).ok().filter(|&h| h > 0)?;
    let x = i32::try_from(x0).ok()?;
    let y = i32::try_from(y0).ok()?;
    Some(PixelRect::at(x, y).of_size(width, height))
}
