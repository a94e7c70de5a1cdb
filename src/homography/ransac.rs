//! RANSAC homography fitting with an adaptive iteration count.

use crate::homography::{Correspondence, Homography, MIN_POINTS};
use crate::trace::trace_event;
use crate::util::{ScreenMatchError, ScreenMatchResult};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// RANSAC parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RansacParams {
    /// Maximum reprojection error, in pixels, for an inlier.
    pub reproj_threshold: f64,
    /// Upper bound on sampling iterations.
    pub max_iters: usize,
    /// Desired probability that one sample is outlier-free.
    pub confidence: f64,
    /// Seed of the sampling generator.
    pub seed: u64,
    /// Fewest inliers an accepted model needs; never below four.
    pub min_inliers: usize,
    /// Smallest accepted share of inliers among all correspondences.
    pub min_inlier_ratio: f64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            reproj_threshold: 15.0,
            max_iters: 2000,
            confidence: 0.995,
            seed: 0x00c0_ffee,
            min_inliers: 10,
            min_inlier_ratio: 0.25,
        }
    }
}

/// Result of a RANSAC fit.
#[derive(Clone, Debug, PartialEq)]
pub struct RansacFit {
    /// Model refit on all inliers.
    pub homography: Homography,
    /// Inlier flag per input correspondence.
    pub inliers: Vec<bool>,
    /// Number of inliers of the final model.
    pub n_inliers: usize,
    /// Sampling iterations actually run.
    pub iterations: usize,
}

/// Fits a homography robust to outliers.
///
/// Minimal samples with three collinear points on either side are skipped.
/// The iteration budget shrinks as the best inlier ratio grows.
pub fn fit_homography_ransac(
    pairs: &[Correspondence],
    params: &RansacParams,
) -> ScreenMatchResult<RansacFit> {
    let n = pairs.len();
    if n < MIN_POINTS {
        return Err(ScreenMatchError::TooFewCorrespondences {
            needed: MIN_POINTS,
            got: n,
        });
    }
    let valid = params.reproj_threshold > 0.0
        && (0.0..1.0).contains(&params.confidence)
        && (0.0..=1.0).contains(&params.min_inlier_ratio);
    if !valid {
        return Err(ScreenMatchError::InvalidInput(
            "RANSAC needs a positive threshold, a confidence in [0, 1) and an inlier ratio in [0, 1]",
        ));
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Option<(Homography, usize)> = None;
    let mut budget = params.max_iters;
    let mut iterations = 0usize;

    while iterations < budget {
        iterations += 1;
        let sample: Vec<Correspondence> = rand::seq::index::sample(&mut rng, n, MIN_POINTS)
            .iter()
            .map(|i| pairs[i])
            .collect();
        if is_degenerate_sample(&sample) {
            continue;
        }
        let Ok(model) = Homography::from_correspondences(&sample) else {
            continue;
        };

        let count = count_inliers(&model, pairs, params.reproj_threshold);
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((model, count));
            budget = budget.min(adaptive_iterations(count, n, params));
        }
    }

    let Some((model, count)) = best else {
        return Err(ScreenMatchError::NumericalFailure(
            "every RANSAC sample was degenerate",
        ));
    };
    let needed = required_inliers(n, params);
    if count < needed {
        trace_event!("ransac_rejected", inliers = count, needed = needed);
        return Err(ScreenMatchError::TooFewCorrespondences { needed, got: count });
    }

    let inlier_pairs: Vec<Correspondence> = pairs
        .iter()
        .filter(|c| model.reprojection_error(c) <= params.reproj_threshold)
        .copied()
        .collect();
    let homography = Homography::from_correspondences(&inlier_pairs).unwrap_or(model);
    let inliers: Vec<bool> = pairs
        .iter()
        .map(|c| homography.reprojection_error(c) <= params.reproj_threshold)
        .collect();
    let n_inliers = inliers.iter().filter(|&&v| v).count();

    trace_event!(
        "ransac_fit",
        correspondences = n,
        inliers = n_inliers,
        iterations = iterations
    );
    Ok(RansacFit {
        homography,
        inliers,
        n_inliers,
        iterations,
    })
}

/// Consensus an accepted model must reach among `n` correspondences.
fn required_inliers(n: usize, params: &RansacParams) -> usize {
    let by_ratio = (params.min_inlier_ratio * n as f64).ceil() as usize;
    params.min_inliers.max(MIN_POINTS).max(by_ratio)
}

fn count_inliers(model: &Homography, pairs: &[Correspondence], threshold: f64) -> usize {
    pairs
        .iter()
        .filter(|c| model.reprojection_error(c) <= threshold)
        .count()
}

/// Iterations needed to draw an all-inlier sample with `params.confidence`.
fn adaptive_iterations(inliers: usize, n: usize, params: &RansacParams) -> usize {
    let ratio = inliers as f64 / n as f64;
    let p_good = ratio.powi(MIN_POINTS as i32);
    if p_good >= 1.0 - f64::EPSILON {
        return 1;
    }
    if p_good <= f64::EPSILON {
        return params.max_iters;
    }
    let needed = (1.0 - params.confidence).ln() / (1.0 - p_good).ln();
    if needed.is_finite() {
        (needed.ceil().max(1.0) as usize).min(params.max_iters)
    } else {
        params.max_iters
    }
}

fn is_degenerate_sample(sample: &[Correspondence]) -> bool {
    let src: Vec<[f64; 2]> = sample.iter().map(|c| c.src).collect();
    let dst: Vec<[f64; 2]> = sample.iter().map(|c| c.dst).collect();
    has_collinear_triple(&src) || has_collinear_triple(&dst)
}

fn has_collinear_triple(pts: &[[f64; 2]]) -> bool {
    const MIN_AREA: f64 = 1e-3;
    for i in 0..pts.len() {
        for j in i + 1..pts.len() {
            for k in j + 1..pts.len() {
                let (a, b, c) = (pts[i], pts[j], pts[k]);
                let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
                if cross.abs() < MIN_AREA {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{adaptive_iterations, fit_homography_ransac, required_inliers, RansacParams};
    use crate::homography::{Correspondence, Homography};
    use crate::util::ScreenMatchError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn grid_pairs(h: &Homography) -> Vec<Correspondence> {
        let mut out = Vec::new();
        for gy in 0..5 {
            for gx in 0..6 {
                let p = [gx as f64 * 20.0 + 3.0, gy as f64 * 15.0 + 1.0];
                out.push(Correspondence::new(p, h.apply(p).unwrap()));
            }
        }
        out
    }

    #[test]
    fn recovers_translation_with_outliers() {
        let truth = Homography::translation(140.0, 60.0);
        let mut pairs = grid_pairs(&truth);
        let clean = pairs.len();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..12 {
            let src = [rng.random_range(0.0..100.0), rng.random_range(0.0..60.0)];
            let dst = [rng.random_range(300.0..400.0), rng.random_range(200.0..300.0)];
            pairs.push(Correspondence::new(src, dst));
        }

        let fit = fit_homography_ransac(&pairs, &RansacParams::default()).unwrap();
        assert!(fit.n_inliers >= clean);
        for c in &pairs[..clean] {
            assert!(fit.homography.reprojection_error(c) < 1e-6);
        }
        assert!(fit.iterations <= RansacParams::default().max_iters);
    }

    #[test]
    fn fit_is_deterministic() {
        let truth = Homography::translation(-5.0, 9.0);
        let pairs = grid_pairs(&truth);
        let a = fit_homography_ransac(&pairs, &RansacParams::default()).unwrap();
        let b = fit_homography_ransac(&pairs, &RansacParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn collinear_points_never_fit() {
        let pairs: Vec<Correspondence> = (0..8)
            .map(|i| {
                let p = [i as f64 * 10.0, 5.0];
                Correspondence::new(p, [p[0] + 1.0, p[1]])
            })
            .collect();
        assert!(fit_homography_ransac(&pairs, &RansacParams::default()).is_err());
    }

    #[test]
    fn adaptive_budget_shrinks_with_inlier_ratio() {
        let params = RansacParams::default();
        assert_eq!(adaptive_iterations(10, 10, &params), 1);
        assert_eq!(adaptive_iterations(0, 10, &params), params.max_iters);
        let half = adaptive_iterations(50, 100, &params);
        assert!(half > 10 && half < params.max_iters);
    }

    #[test]
    fn consensus_floor_uses_count_and_ratio() {
        let params = RansacParams::default();
        assert_eq!(required_inliers(12, &params), 10);
        assert_eq!(required_inliers(100, &params), 25);
        let loose = RansacParams {
            min_inliers: 0,
            min_inlier_ratio: 0.0,
            ..params
        };
        assert_eq!(required_inliers(50, &loose), 4);
    }

    #[test]
    fn unrelated_points_have_no_consensus() {
        let mut rng = StdRng::seed_from_u64(5);
        let pairs: Vec<Correspondence> = (0..40)
            .map(|_| {
                let src = [rng.random_range(0.0..120.0), rng.random_range(0.0..90.0)];
                let dst = [rng.random_range(0.0..400.0), rng.random_range(0.0..300.0)];
                Correspondence::new(src, dst)
            })
            .collect();

        let err = fit_homography_ransac(&pairs, &RansacParams::default()).unwrap_err();
        assert!(matches!(
            err,
            ScreenMatchError::TooFewCorrespondences { needed: 10, .. }
        ));
    }

    #[test]
    fn inlier_ratio_outside_unit_range_is_rejected() {
        let pairs = grid_pairs(&Homography::identity());
        let params = RansacParams {
            min_inlier_ratio: 1.5,
            ..RansacParams::default()
        };
        let err = fit_homography_ransac(&pairs, &params).unwrap_err();
        assert!(err.is_invalid_input());
    }
}
