//! Template statistics precomputed once per correlation scan.

use crate::image::{ImageView, MAX_CHANNELS};
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Per-template sums shared by every correlation method.
///
/// Values are stored row-major with interleaved channels so the scan can walk
/// template and window rows in lockstep.
#[derive(Clone, Debug)]
pub struct CorrelationPlan {
    width: usize,
    height: usize,
    channels: usize,
    values: Vec<f64>,
    sums: [f64; MAX_CHANNELS],
    sum_sq: f64,
}

impl CorrelationPlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> ScreenMatchResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let channels = tpl.channels();
        let count = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(channels))
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;

        let mut values = Vec::with_capacity(count);
        let mut sums = [0.0f64; MAX_CHANNELS];
        let mut sum_sq = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(ScreenMatchError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: tpl.as_slice().len(),
            })?;
            for (idx, &value) in row.iter().enumerate() {
                let v = f64::from(value);
                sums[idx % channels] += v;
                sum_sq += v * v;
                values.push(v);
            }
        }

        Ok(Self {
            width,
            height,
            channels,
            values,
            sums,
            sum_sq,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of pixels per channel.
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Number of samples over all channels.
    pub fn element_count(&self) -> usize {
        self.values.len()
    }

    /// Template samples in row-major interleaved order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Per-channel sums of template samples.
    pub fn sums(&self) -> &[f64] {
        &self.sums[..self.channels]
    }

    /// Sum of squared samples over all channels.
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// `sqrt(ΣT²)`.
    pub fn norm(&self) -> f64 {
        self.sum_sq.sqrt()
    }

    /// `sqrt(Σ(T − μT)²)` with per-channel means.
    pub fn centered_norm(&self) -> f64 {
        let n = self.pixel_count() as f64;
        let mean_sq: f64 = self.sums().iter().map(|s| s * s / n).sum();
        (self.sum_sq - mean_sq).max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::CorrelationPlan;
    use crate::ImageView;

    #[test]
    fn plan_matches_known_stats() {
        let data = [0u8, 1, 2, 3];
        let view = ImageView::from_slice(&data, 2, 2).unwrap();
        let plan = CorrelationPlan::from_view(view).unwrap();

        assert_eq!(plan.element_count(), 4);
        assert_eq!(plan.sums(), &[6.0]);
        assert!((plan.sum_sq() - 14.0).abs() < 1e-12);
        // Σ(T − 1.5)² = 5
        assert!((plan.centered_norm() - 5.0f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn plan_keeps_channel_sums_apart() {
        let data = [10u8, 0, 20, 0, 30, 0];
        let view = ImageView::from_interleaved(&data, 3, 1, 2).unwrap();
        let plan = CorrelationPlan::from_view(view).unwrap();

        assert_eq!(plan.channels(), 2);
        assert_eq!(plan.sums(), &[60.0, 0.0]);
        assert_eq!(plan.pixel_count(), 3);
        assert_eq!(plan.element_count(), 6);
    }
}
