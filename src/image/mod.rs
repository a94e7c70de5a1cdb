//! Image views, owned buffers and pyramid utilities.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer of interleaved pixels
//! with an explicit stride. The stride counts elements between the starts of
//! consecutive rows, so a stride larger than `width * channels` represents
//! padded rows. ROI slices are zero-copy views into the same backing slice and
//! retain the original stride.

use crate::geometry::Rect;
use crate::util::{ScreenMatchError, ScreenMatchResult};

#[cfg(feature = "image-io")]
pub mod io;
#[cfg(feature = "image-io")]
pub mod overlay;
pub mod pyramid;

pub use pyramid::OwnedImage;

/// Largest channel count accepted by views.
pub const MAX_CHANNELS: usize = 4;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous single-channel view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> ScreenMatchResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a single-channel view with an explicit stride.
    pub fn new(
        data: &'a [T],
        width: usize,
        height: usize,
        stride: usize,
    ) -> ScreenMatchResult<Self> {
        Self::with_layout(data, width, height, stride, 1)
    }

    /// Creates a contiguous view of interleaved pixels with `channels` samples each.
    pub fn from_interleaved(
        data: &'a [T],
        width: usize,
        height: usize,
        channels: usize,
    ) -> ScreenMatchResult<Self> {
        let stride = width
            .checked_mul(channels)
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        Self::with_layout(data, width, height, stride, channels)
    }

    /// Creates a view with an explicit stride and channel count.
    pub fn with_layout(
        data: &'a [T],
        width: usize,
        height: usize,
        stride: usize,
        channels: usize,
    ) -> ScreenMatchResult<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ScreenMatchError::InvalidInput(
                "channel count must be between 1 and 4",
            ));
        }
        let needed = required_len(width, height, stride, channels)?;
        if data.len() < needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            channels,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the number of interleaved samples per pixel.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the samples of pixel `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [T]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.channels)?)?;
        self.data.get(start..start + self.channels)
    }

    /// Returns a contiguous slice for row `y` with length `width * channels`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * self.channels)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> ScreenMatchResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }

        let out_of_bounds = ScreenMatchError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x * self.channels))
            .ok_or(ScreenMatchError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self
            .data
            .get(start..)
            .ok_or(ScreenMatchError::BufferTooSmall {
                needed: start.saturating_add(1),
                got: self.data.len(),
            })?;

        ImageView::with_layout(data, width, height, self.stride, self.channels)
    }

    /// Returns the ROI described by `region`, or the whole view when `None`.
    pub fn region(&self, region: Option<Rect>) -> ScreenMatchResult<ImageView<'a, T>> {
        match region {
            None => Ok(ImageView {
                data: self.data,
                width: self.width,
                height: self.height,
                stride: self.stride,
                channels: self.channels,
            }),
            Some(rect) => {
                let (x, y, width, height) = rect.to_roi()?;
                self.roi(x, y, width, height)
            }
        }
    }
}

fn required_len(
    width: usize,
    height: usize,
    stride: usize,
    channels: usize,
) -> ScreenMatchResult<usize> {
    if width == 0 || height == 0 {
        return Err(ScreenMatchError::InvalidDimensions { width, height });
    }
    let row_len = width
        .checked_mul(channels)
        .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
    if stride < row_len {
        return Err(ScreenMatchError::InvalidStride {
            width: row_len,
            stride,
        });
    }
    let needed = (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_len))
        .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
    Ok(needed)
}
