//! Correlation kernels.
//!
//! Each [`CorrelationMethod`] maps to one [`CorrelationKernel`] strategy that
//! turns the statistics of a single image window into a score and an
//! extremum of the resulting surface into a confidence. The scanners in
//! [`scalar`] and [`rayon`] walk every placement and are shared by all
//! methods.

use crate::image::{ImageView, MAX_CHANNELS};
use crate::surface::Extremum;
use crate::template::CorrelationPlan;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use std::fmt;

mod methods;
pub mod scalar;

#[cfg(feature = "rayon")]
pub mod rayon;

pub use methods::{CCoeff, CCoeffNormed, CCorr, CCorrNormed, SqDiff, SqDiffNormed};

/// Intensity-correlation method used to build a correlation surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CorrelationMethod {
    /// `Σ(I − T)²`.
    SqDiff,
    /// `Σ(I − T)²` over `sqrt(ΣI² · ΣT²)`.
    #[default]
    SqDiffNormed,
    /// `Σ I·T`.
    CCorr,
    /// `Σ I·T` over `sqrt(ΣI² · ΣT²)`.
    CCorrNormed,
    /// `Σ(I − μI)(T − μT)`.
    CCoeff,
    /// Zero-mean normalized cross-correlation.
    CCoeffNormed,
}

impl CorrelationMethod {
    /// Every method, in declaration order.
    pub const ALL: [CorrelationMethod; 6] = [
        CorrelationMethod::SqDiff,
        CorrelationMethod::SqDiffNormed,
        CorrelationMethod::CCorr,
        CorrelationMethod::CCorrNormed,
        CorrelationMethod::CCoeff,
        CorrelationMethod::CCoeffNormed,
    ];

    /// Returns the scoring strategy for this method.
    pub fn kernel(self) -> &'static dyn CorrelationKernel {
        match self {
            CorrelationMethod::SqDiff => &SqDiff,
            CorrelationMethod::SqDiffNormed => &SqDiffNormed,
            CorrelationMethod::CCorr => &CCorr,
            CorrelationMethod::CCorrNormed => &CCorrNormed,
            CorrelationMethod::CCoeff => &CCoeff,
            CorrelationMethod::CCoeffNormed => &CCoeffNormed,
        }
    }

    /// True for the squared-difference family, where lower scores are better.
    pub fn seeks_minimum(self) -> bool {
        self.kernel().polarity() == Polarity::Minimize
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kernel().name())
    }
}

/// Direction in which a surface improves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    /// Best placement is the minimum.
    Minimize,
    /// Best placement is the maximum.
    Maximize,
}

/// Sums gathered over one image window at a single placement.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindowStats {
    /// `Σ I·T` over all samples.
    pub cross: f64,
    /// Per-channel `ΣI`.
    pub sums: [f64; MAX_CHANNELS],
    /// `ΣI²` over all samples.
    pub sum_sq: f64,
}

/// Scoring strategy for one correlation method.
pub trait CorrelationKernel: Send + Sync {
    /// Stable identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Whether the best placement is the surface minimum or maximum.
    fn polarity(&self) -> Polarity;

    /// Scores one placement from its window statistics.
    fn score(&self, window: &WindowStats, plan: &CorrelationPlan) -> f32;

    /// Maps the surface extremum to a confidence in `[0, 1]`.
    ///
    /// `element_count` is the number of template samples over all channels.
    fn confidence(&self, extremum: &Extremum, element_count: usize) -> f32;

    /// Returns the best placement for this kernel's polarity.
    fn best_location(&self, extremum: &Extremum) -> (usize, usize) {
        match self.polarity() {
            Polarity::Minimize => extremum.min_loc,
            Polarity::Maximize => extremum.max_loc,
        }
    }
}

/// Validates that `plan` can be placed inside `image` and returns the
/// surface size `(W − w + 1, H − h + 1)`.
pub(crate) fn surface_size(
    image: ImageView<'_, u8>,
    plan: &CorrelationPlan,
) -> ScreenMatchResult<(usize, usize)> {
    if image.channels() != plan.channels() {
        return Err(ScreenMatchError::ChannelMismatch {
            image: image.channels(),
            template: plan.channels(),
        });
    }
    if plan.width() > image.width() || plan.height() > image.height() {
        return Err(ScreenMatchError::TemplateTooLarge {
            template_width: plan.width(),
            template_height: plan.height(),
            image_width: image.width(),
            image_height: image.height(),
        });
    }
    Ok((
        image.width() - plan.width() + 1,
        image.height() - plan.height() + 1,
    ))
}

/// Accumulates the window statistics for the placement at `(x, y)`.
pub(crate) fn window_stats(
    image: ImageView<'_, u8>,
    plan: &CorrelationPlan,
    x: usize,
    y: usize,
) -> ScreenMatchResult<WindowStats> {
    let channels = plan.channels();
    let row_len = plan.width() * channels;
    let start = x * channels;
    let values = plan.values();

    let mut stats = WindowStats::default();
    for ty in 0..plan.height() {
        let window = image
            .row(y + ty)
            .and_then(|row| row.get(start..start + row_len))
            .ok_or(ScreenMatchError::RoiOutOfBounds {
                x,
                y,
                width: plan.width(),
                height: plan.height(),
                img_width: image.width(),
                img_height: image.height(),
            })?;
        let tpl_row = &values[ty * row_len..(ty + 1) * row_len];
        for (idx, (&iv, &tv)) in window.iter().zip(tpl_row).enumerate() {
            let v = f64::from(iv);
            stats.cross += v * tv;
            stats.sums[idx % channels] += v;
            stats.sum_sq += v * v;
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::{surface_size, window_stats, CorrelationMethod, Polarity};
    use crate::template::CorrelationPlan;
    use crate::ImageView;

    #[test]
    fn polarity_follows_method_family() {
        for method in CorrelationMethod::ALL {
            let expected = matches!(
                method,
                CorrelationMethod::SqDiff | CorrelationMethod::SqDiffNormed
            );
            assert_eq!(method.seeks_minimum(), expected, "{method}");
            let polarity = method.kernel().polarity();
            assert_eq!(polarity == Polarity::Minimize, expected);
        }
    }

    #[test]
    fn surface_size_rejects_oversized_template() {
        let img = [0u8; 12];
        let tpl = [0u8; 8];
        let image = ImageView::from_slice(&img, 4, 3).unwrap();
        let plan = CorrelationPlan::from_view(ImageView::from_slice(&tpl, 2, 4).unwrap()).unwrap();
        let err = surface_size(image, &plan).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn window_stats_sum_over_template_area() {
        let img: Vec<u8> = (0..16).collect();
        let tpl = [1u8, 1, 1, 1];
        let image = ImageView::from_slice(&img, 4, 4).unwrap();
        let plan = CorrelationPlan::from_view(ImageView::from_slice(&tpl, 2, 2).unwrap()).unwrap();
        assert_eq!(surface_size(image, &plan).unwrap(), (3, 3));

        // Window at (1, 1) covers 5, 6, 9, 10.
        let stats = window_stats(image, &plan, 1, 1).unwrap();
        assert_eq!(stats.cross, 30.0);
        assert_eq!(stats.sums[0], 30.0);
        assert_eq!(stats.sum_sq, 25.0 + 36.0 + 81.0 + 100.0);
    }
}
