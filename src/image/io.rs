//! Pixel-buffer bridge between the `image` crate and internal buffers.
//!
//! Available when the `image-io` feature is enabled. Conversions preserve
//! width and height and produce either a single-channel luma layout or a
//! three-channel RGB layout.

use crate::image::{ImageView, OwnedImage};
use crate::util::{ScreenMatchError, ScreenMatchResult};
use image::{DynamicImage, GrayImage, RgbImage};
use std::path::Path;

/// Channel layout of an internal buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// One luma sample per pixel.
    Gray,
    /// Three interleaved samples per pixel in R, G, B order.
    #[default]
    Rgb,
}

impl Layout {
    /// Number of samples per pixel for this layout.
    pub fn channels(self) -> usize {
        match self {
            Layout::Gray => 1,
            Layout::Rgb => 3,
        }
    }
}

/// Creates a borrowed view from a grayscale image buffer.
pub fn view_from_gray_image(img: &GrayImage) -> ScreenMatchResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Creates a borrowed three-channel view from an RGB image buffer.
pub fn view_from_rgb_image(img: &RgbImage) -> ScreenMatchResult<ImageView<'_, u8>> {
    ImageView::from_interleaved(img.as_raw(), img.width() as usize, img.height() as usize, 3)
}

/// Converts a decoded image into an internal buffer with the given layout.
pub fn to_internal(img: &DynamicImage, layout: Layout) -> ScreenMatchResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    match layout {
        Layout::Gray => OwnedImage::new(img.to_luma8().into_raw(), width, height),
        Layout::Rgb => OwnedImage::from_interleaved(img.to_rgb8().into_raw(), width, height, 3),
    }
}

/// Converts an internal buffer back into a decoded image.
///
/// One-channel buffers become `ImageLuma8`, three-channel buffers `ImageRgb8`
/// and four-channel buffers `ImageRgba8`.
pub fn from_internal(img: &OwnedImage) -> ScreenMatchResult<DynamicImage> {
    let width = u32::try_from(img.width()).map_err(|_| ScreenMatchError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let height = u32::try_from(img.height()).map_err(|_| ScreenMatchError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let data = img.data().to_vec();
    let converted = match img.channels() {
        1 => image::GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
        3 => image::RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
        4 => image::RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        _ => {
            return Err(ScreenMatchError::InvalidInput(
                "only 1, 3 or 4 channel buffers convert to images",
            ))
        }
    };
    converted.ok_or(ScreenMatchError::BufferTooSmall {
        needed: img.width() * img.height() * img.channels(),
        got: img.data().len(),
    })
}

/// Loads an image from disk and converts it to the given layout.
pub fn load_image<P: AsRef<Path>>(path: P, layout: Layout) -> ScreenMatchResult<OwnedImage> {
    let img = image::open(path).map_err(|err| ScreenMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    to_internal(&img, layout)
}

/// Loads an image from disk and converts it to a grayscale owned image.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> ScreenMatchResult<OwnedImage> {
    load_image(path, Layout::Gray)
}
