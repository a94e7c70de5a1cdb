//! The six correlation methods.
//!
//! Normalized methods guard near-zero denominators the same way for every
//! method: with numerator `n` and denominator `t`, `|n| < t` gives `n / t`,
//! `|n| < 1.125 t` saturates to `±1`, and anything larger collapses to a
//! method-specific value (`1` for squared differences, `0` otherwise).

use crate::kernel::{CorrelationKernel, Polarity, WindowStats};
use crate::surface::Extremum;
use crate::template::CorrelationPlan;

const MAX_SAMPLE: f64 = 255.0;
const HALF_RANGE: f64 = 127.5;

/// Squared difference.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqDiff;

/// Normalized squared difference.
#[derive(Clone, Copy, Debug, Default)]
pub struct SqDiffNormed;

/// Cross-correlation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CCorr;

/// Normalized cross-correlation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CCorrNormed;

/// Correlation coefficient.
#[derive(Clone, Copy, Debug, Default)]
pub struct CCoeff;

/// Normalized correlation coefficient.
#[derive(Clone, Copy, Debug, Default)]
pub struct CCoeffNormed;

fn guarded(num: f64, denom: f64, overflow: f64) -> f64 {
    if num.abs() < denom {
        num / denom
    } else if num.abs() < denom * 1.125 {
        if num > 0.0 {
            1.0
        } else {
            -1.0
        }
    } else {
        overflow
    }
}

fn unit(value: f64) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

fn squared_difference(window: &WindowStats, plan: &CorrelationPlan) -> f64 {
    (window.sum_sq - 2.0 * window.cross + plan.sum_sq()).max(0.0)
}

fn centered_cross(window: &WindowStats, plan: &CorrelationPlan) -> f64 {
    let n = plan.pixel_count() as f64;
    let mean_product: f64 = window
        .sums
        .iter()
        .zip(plan.sums())
        .map(|(w, t)| w * t / n)
        .sum();
    window.cross - mean_product
}

fn window_norm(window: &WindowStats) -> f64 {
    window.sum_sq.max(0.0).sqrt()
}

impl CorrelationKernel for SqDiff {
    fn name(&self) -> &'static str {
        "sqdiff"
    }

    fn polarity(&self) -> Polarity {
        Polarity::Minimize
    }

    fn score(&self, window: &WindowStats, plan: &CorrelationPlan) -> f32 {
        squared_difference(window, plan) as f32
    }

    fn confidence(&self, extremum: &Extremum, element_count: usize) -> f32 {
        let scale = element_count as f64 * MAX_SAMPLE * MAX_SAMPLE;
        unit(1.0 - f64::from(extremum.min_val) / scale)
    }
}

impl CorrelationKernel for SqDiffNormed {
    fn name(&self) -> &'static str {
        "sqdiff_normed"
    }

    fn polarity(&self) -> Polarity {
        Polarity::Minimize
    }

    fn score(&self, window: &WindowStats, plan: &CorrelationPlan) -> f32 {
        let denom = window_norm(window) * plan.norm();
        guarded(squared_difference(window, plan), denom, 1.0) as f32
    }

    fn confidence(&self, extremum: &Extremum, _element_count: usize) -> f32 {
        unit(1.0 - f64::from(extremum.min_val))
    }
}

impl CorrelationKernel for CCorr {
    fn name(&self) -> &'static str {
        "ccorr"
    }

    fn polarity(&self) -> Polarity {
        Polarity::Maximize
    }

    fn score(&self, window: &WindowStats, _plan: &CorrelationPlan) -> f32 {
        window.cross as f32
    }

    fn confidence(&self, extremum: &Extremum, element_count: usize) -> f32 {
        let scale = element_count as f64 * MAX_SAMPLE * MAX_SAMPLE;
        unit(f64::from(extremum.max_val) / scale)
    }
}

impl CorrelationKernel for CCorrNormed {
    fn name(&self) -> &'static str {
        "ccorr_normed"
    }

    fn polarity(&self) -> Polarity {
        Polarity::Maximize
    }

    fn score(&self, window: &WindowStats, plan: &CorrelationPlan) -> f32 {
        let denom = window_norm(window) * plan.norm();
        guarded(window.cross, denom, 0.0) as f32
    }

    fn confidence(&self, extremum: &Extremum, _element_count: usize) -> f32 {
        unit(f64::from(extremum.max_val))
    }
}

impl CorrelationKernel for CCoeff {
    fn name(&self) -> &'static str {
        "ccoeff"
    }

    fn polarity(&self) -> Polarity {
        Polarity::Maximize
    }

    fn score(&self, window: &WindowStats, plan: &CorrelationPlan) -> f32 {
        centered_cross(window, plan) as f32
    }

    fn confidence(&self, extremum: &Extremum, element_count: usize) -> f32 {
        let scale = element_count as f64 * HALF_RANGE * HALF_RANGE;
        unit(f64::from(extremum.max_val) / scale)
    }
}

impl CorrelationKernel for CCoeffNormed {
    fn name(&self) -> &'static str {
        "ccoeff_normed"
    }

    fn polarity(&self) -> Polarity {
        Polarity::Maximize
    }

    fn score(&self, window: &WindowStats, plan: &CorrelationPlan) -> f32 {
        let tpl_norm = plan.centered_norm();
        // A flat template correlates perfectly with every window.
        if tpl_norm < f64::EPSILON {
            return 1.0;
        }
        let n = plan.pixel_count() as f64;
        let mean_sq: f64 = window.sums.iter().map(|s| s * s / n).sum();
        let denom = (window.sum_sq - mean_sq).max(0.0).sqrt() * tpl_norm;
        guarded(centered_cross(window, plan), denom, 0.0) as f32
    }

    fn confidence(&self, extremum: &Extremum, _element_count: usize) -> f32 {
        unit(f64::from(extremum.max_val))
    }
}
