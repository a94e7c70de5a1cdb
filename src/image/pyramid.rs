//! Owned image buffers and the grayscale pyramid used by the ORB extractor.
//!
//! Downsampling uses a 2x2 box filter with integer rounding:
//! `dst = ((a + b + c + d) + 2) / 4`. Pixel `(x, y)` of level `l` covers the
//! base pixels `[2^l * x, 2^l * (x + 1))`, so a level coordinate maps back to
//! the base level as `(x + 0.5) * 2^l - 0.5`.

use crate::image::ImageView;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Owned contiguous image buffer with interleaved channels.
#[derive(Clone, Debug, PartialEq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
    channels: usize,
}

impl OwnedImage {
    /// Creates a single-channel image from a contiguous buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> ScreenMatchResult<Self> {
        Self::from_interleaved(data, width, height, 1)
    }

    /// Creates an image of interleaved pixels with `channels` samples each.
    pub fn from_interleaved(
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> ScreenMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        if channels == 0 || channels > super::MAX_CHANNELS {
            return Err(ScreenMatchError::InvalidInput(
                "channel count must be between 1 and 4",
            ));
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> ScreenMatchResult<Self> {
        let row_len = view.width() * view.channels();
        let mut data = Vec::with_capacity(row_len * view.height());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::from_interleaved(data, view.width(), view.height(), view.channels())
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width * self.channels,
            channels: self.channels,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the contiguous pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the image and returns its pixel data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Converts a view to a single-channel luma image.
///
/// Three- and four-channel inputs are treated as RGB(A) and weighted with the
/// fixed-point BT.601 coefficients `(77, 150, 29) / 256`; two-channel inputs
/// keep their first sample.
pub fn to_gray(view: ImageView<'_, u8>) -> ScreenMatchResult<OwnedImage> {
    if view.channels() == 1 {
        return OwnedImage::from_view(view);
    }
    let width = view.width();
    let height = view.height();
    let channels = view.channels();
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        let row = view.row(y).ok_or(ScreenMatchError::BufferTooSmall {
            needed: (y + 1) * view.stride(),
            got: view.as_slice().len(),
        })?;
        for px in row.chunks_exact(channels) {
            let luma = if channels >= 3 {
                let sum = 77 * u32::from(px[0]) + 150 * u32::from(px[1]) + 29 * u32::from(px[2]);
                ((sum + 128) >> 8) as u8
            } else {
                px[0]
            };
            data.push(luma);
        }
    }
    OwnedImage::new(data, width, height)
}

/// Owned image pyramid built from a base level.
pub struct ImagePyramid {
    levels: Vec<OwnedImage>,
}

impl ImagePyramid {
    /// Builds a pyramid from a base grayscale view.
    ///
    /// `max_levels` is clamped to at least 1 so the base level is always present.
    pub fn build_u8(base: ImageView<'_, u8>, max_levels: usize) -> ScreenMatchResult<Self> {
        if base.channels() != 1 {
            return Err(ScreenMatchError::InvalidInput(
                "pyramids are built from single-channel images",
            ));
        }
        let max_levels = max_levels.max(1);
        let mut levels = vec![OwnedImage::from_view(base)?];

        while levels.len() < max_levels {
            let Some(src) = levels.last().map(OwnedImage::view) else {
                break;
            };
            if src.width() < 2 || src.height() < 2 {
                break;
            }

            let dst_width = src.width() / 2;
            let dst_height = src.height() / 2;
            let mut dst = vec![0u8; dst_width * dst_height];
            let src_data = src.as_slice();
            let src_stride = src.stride();

            for y in 0..dst_height {
                let row0 = &src_data[(2 * y) * src_stride..];
                let row1 = &src_data[(2 * y + 1) * src_stride..];
                for x in 0..dst_width {
                    let a = row0[2 * x];
                    let b = row0[2 * x + 1];
                    let c = row1[2 * x];
                    let d = row1[2 * x + 1];
                    let sum = u16::from(a) + u16::from(b) + u16::from(c) + u16::from(d);
                    dst[y * dst_width + x] = ((sum + 2) / 4) as u8;
                }
            }

            levels.push(OwnedImage::new(dst, dst_width, dst_height)?);
        }

        Ok(Self { levels })
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[OwnedImage] {
        &self.levels
    }

    /// Returns a view for a specific pyramid level.
    pub fn level(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.levels.get(index).map(|level| level.view())
    }

    /// Maps a coordinate at `level` back to base-level pixel coordinates.
    pub fn to_base(level: usize, x: f32, y: f32) -> (f32, f32) {
        let scale = (1u32 << level) as f32;
        ((x + 0.5) * scale - 0.5, (y + 0.5) * scale - 0.5)
    }
}
