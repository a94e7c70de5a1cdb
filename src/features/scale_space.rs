//! Float grayscale images for the feature detectors, with Gaussian smoothing
//! from `imageproc`.

use crate::image::ImageView;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use image::{ImageBuffer, Luma};

type Buffer = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Contiguous single-channel `f32` image.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayF32 {
    buffer: Buffer,
}

impl GrayF32 {
    /// Creates an image filled with `value`.
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            buffer: ImageBuffer::from_pixel(width, height, Luma([value])),
        }
    }

    /// Converts a single-channel `u8` view to float samples.
    pub fn from_view(view: ImageView<'_, u8>) -> ScreenMatchResult<Self> {
        if view.channels() != 1 {
            return Err(ScreenMatchError::InvalidInput(
                "feature extraction needs a single-channel image",
            ));
        }
        let too_large = ScreenMatchError::InvalidDimensions {
            width: view.width(),
            height: view.height(),
        };
        let width = u32::try_from(view.width()).map_err(|_| too_large.clone())?;
        let height = u32::try_from(view.height()).map_err(|_| too_large)?;

        let mut data = Vec::with_capacity(view.width() * view.height());
        for y in 0..view.height() {
            let row = view.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend(row.iter().map(|&v| f32::from(v)));
        }
        let buffer = ImageBuffer::from_raw(width, height, data).ok_or(
            ScreenMatchError::BufferTooSmall {
                needed: view.width() * view.height(),
                got: 0,
            },
        )?;
        Ok(Self { buffer })
    }

    pub fn width(&self) -> usize {
        self.buffer.width() as usize
    }

    pub fn height(&self) -> usize {
        self.buffer.height() as usize
    }

    pub fn data(&self) -> &[f32] {
        self.buffer.as_raw()
    }

    /// Sample at `(x, y)`; callers keep coordinates in bounds.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.buffer.as_raw()[y * self.width() + x]
    }

    /// Sample at signed coordinates, replicating the border.
    #[inline]
    pub fn at_clamped(&self, x: isize, y: isize) -> f32 {
        let cx = x.clamp(0, self.width() as isize - 1) as usize;
        let cy = y.clamp(0, self.height() as isize - 1) as usize;
        self.at(cx, cy)
    }

    /// Keeps every second sample in both directions.
    pub fn decimate(&self) -> Self {
        let (w, h) = self.buffer.dimensions();
        let buffer = ImageBuffer::from_fn((w / 2).max(1), (h / 2).max(1), |x, y| {
            *self.buffer.get_pixel((2 * x).min(w - 1), (2 * y).min(h - 1))
        });
        Self { buffer }
    }

    /// Pixel-wise `self − other`.
    pub fn difference(&self, other: &GrayF32) -> ScreenMatchResult<Self> {
        if self.buffer.dimensions() != other.buffer.dimensions() {
            return Err(ScreenMatchError::InvalidDimensions {
                width: other.width(),
                height: other.height(),
            });
        }
        let (w, h) = self.buffer.dimensions();
        let buffer = ImageBuffer::from_fn(w, h, |x, y| {
            Luma([self.buffer.get_pixel(x, y)[0] - other.buffer.get_pixel(x, y)[0]])
        });
        Ok(Self { buffer })
    }

    /// Gaussian blur; a non-positive `sigma` returns a copy.
    pub fn gaussian_blur(&self, sigma: f32) -> Self {
        if sigma <= 0.0 || !sigma.is_finite() {
            return self.clone();
        }
        Self {
            buffer: imageproc::filter::gaussian_blur_f32(&self.buffer, sigma),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GrayF32;
    use crate::ImageView;

    #[test]
    fn blur_preserves_constant_image() {
        let img = GrayF32::filled(9, 7, 42.0);
        let blurred = img.gaussian_blur(2.0);
        assert!(blurred.data().iter().all(|v| (v - 42.0).abs() < 1e-3));
    }

    #[test]
    fn blur_spreads_an_impulse_symmetrically() {
        let mut data = vec![0u8; 11 * 11];
        data[5 * 11 + 5] = 255;
        let view = ImageView::from_slice(&data, 11, 11).unwrap();
        let blurred = GrayF32::from_view(view).unwrap().gaussian_blur(1.0);

        let center = blurred.at(5, 5);
        assert!(center < 255.0 && center > blurred.at(4, 5));
        assert!((blurred.at(4, 5) - blurred.at(6, 5)).abs() < 1e-3);
        assert!((blurred.at(5, 4) - blurred.at(5, 6)).abs() < 1e-3);
    }

    #[test]
    fn non_positive_sigma_is_a_copy() {
        let data: Vec<u8> = (0..20).collect();
        let img = GrayF32::from_view(ImageView::from_slice(&data, 5, 4).unwrap()).unwrap();
        assert_eq!(img.gaussian_blur(0.0), img);
    }

    #[test]
    fn decimate_halves_size() {
        let data: Vec<u8> = (0..30).collect();
        let view = ImageView::from_slice(&data, 6, 5).unwrap();
        let img = GrayF32::from_view(view).unwrap();
        let half = img.decimate();
        assert_eq!((half.width(), half.height()), (3, 2));
        assert_eq!(half.at(1, 1), 14.0);
    }

    #[test]
    fn difference_needs_matching_sizes() {
        let a = GrayF32::filled(4, 3, 5.0);
        let b = GrayF32::filled(4, 3, 2.0);
        assert!(a.difference(&b).unwrap().data().iter().all(|&v| v == 3.0));
        assert!(a.difference(&GrayF32::filled(3, 3, 0.0)).is_err());
    }
}
