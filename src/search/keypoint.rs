//! Keypoint matching: detect, describe, pair, fit a homography and project
//! the template outline into the source.

use crate::backend::VisionBackend;
use crate::features::{DescriptorMatch, DescriptorPairing, FeatureAlgorithm, Features};
use crate::geometry::Rect;
use crate::homography::{Correspondence, RansacParams};
use crate::image::ImageView;
use crate::search::MatchResult;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{ScreenMatchError, ScreenMatchResult};

const MIN_CORRESPONDENCES: usize = 4;

/// Locates `template` in `source` through keypoint correspondences.
///
/// `ratio` is the ratio-test factor for k-NN pairing and must lie in
/// `(0, 1]`; the result echoes it as its confidence. Every failure after the
/// argument check collapses to `KeypointMatchFailed`.
pub fn match_by_keypoints<B: VisionBackend + ?Sized>(
    backend: &B,
    source: ImageView<'_, u8>,
    template: ImageView<'_, u8>,
    algorithm: FeatureAlgorithm,
    ratio: f32,
) -> ScreenMatchResult<MatchResult> {
    if !(ratio.is_finite() && ratio > 0.0 && ratio <= 1.0) {
        return Err(ScreenMatchError::InvalidInput(
            "ratio must be a finite value in (0, 1]",
        ));
    }

    let _span = trace_span!("keypoint_match", algorithm = %algorithm, ratio = ratio).entered();
    run_pipeline(backend, source, template, algorithm, ratio).map_err(|err| {
        trace_warn!("keypoint matching with {} failed: {}", algorithm, err);
        ScreenMatchError::KeypointMatchFailed { algorithm }
    })
}

fn run_pipeline<B: VisionBackend + ?Sized>(
    backend: &B,
    source: ImageView<'_, u8>,
    template: ImageView<'_, u8>,
    algorithm: FeatureAlgorithm,
    ratio: f32,
) -> ScreenMatchResult<MatchResult> {
    let tpl_features = backend.detect_and_describe(template, algorithm)?;
    let src_features = backend.detect_and_describe(source, algorithm)?;
    trace_event!(
        "keypoints",
        template = tpl_features.keypoints.len(),
        source = src_features.keypoints.len()
    );

    let matches = match algorithm.pairing() {
        DescriptorPairing::KnnRatio => backend
            .knn_match(&tpl_features.descriptors, &src_features.descriptors, 2)?
            .iter()
            .filter_map(|neighbours| ratio_test(neighbours, ratio))
            .collect(),
        DescriptorPairing::CrossCheck => {
            backend.cross_check_match(&tpl_features.descriptors, &src_features.descriptors)?
        }
    };
    trace_event!("correspondences", count = matches.len());
    if matches.len() < MIN_CORRESPONDENCES {
        return Err(ScreenMatchError::TooFewCorrespondences {
            needed: MIN_CORRESPONDENCES,
            got: matches.len(),
        });
    }

    let pairs = correspondences(&matches, &tpl_features, &src_features)?;
    let homography = backend.fit_homography(&pairs, &RansacParams::default())?;

    let (w, h) = (template.width() as f64, template.height() as f64);
    let corners = backend.project(&[[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]], &homography)?;
    let bounds = Rect::from_placement(0, 0, source.width(), source.height());
    let rect = outline_rect(&corners, bounds)?;
    Ok(MatchResult::new(rect, ratio))
}

/// Keeps the nearest neighbour when it is clearly closer than the second.
fn ratio_test(neighbours: &[DescriptorMatch], ratio: f32) -> Option<DescriptorMatch> {
    match neighbours {
        [best, second, ..] if best.distance < ratio * second.distance => Some(*best),
        _ => None,
    }
}

fn correspondences(
    matches: &[DescriptorMatch],
    template: &Features,
    source: &Features,
) -> ScreenMatchResult<Vec<Correspondence>> {
    matches
        .iter()
        .map(|m| {
            let src = template.keypoints.get(m.query_idx);
            let dst = source.keypoints.get(m.train_idx);
            match (src, dst) {
                (Some(s), Some(d)) => Ok(Correspondence::new(
                    [f64::from(s.x), f64::from(s.y)],
                    [f64::from(d.x), f64::from(d.y)],
                )),
                _ => Err(ScreenMatchError::InvalidInput(
                    "descriptor match refers to a missing keypoint",
                )),
            }
        })
        .collect()
}

/// Rectangle spanned by the projected top-left, top-right and bottom-left
/// corners, truncated toward zero.
///
/// The outline must be a convex quadrilateral with the template's corner
/// order, and the rectangle must be non-empty and lie inside `bounds`.
fn outline_rect(corners: &[[f64; 2]], bounds: Rect) -> ScreenMatchResult<Rect> {
    let [tl, tr, br, bl] = corners else {
        return Err(ScreenMatchError::NumericalFailure(
            "projection must return four corners",
        ));
    };
    let quad = [*tl, *tr, *br, *bl];
    let convex = (0..4).all(|i| {
        let (a, b, c) = (quad[i], quad[(i + 1) % 4], quad[(i + 2) % 4]);
        (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]) > 0.0
    });
    if !convex {
        return Err(ScreenMatchError::NumericalFailure(
            "projected outline is folded or mirrored",
        ));
    }

    let rect = Rect::new(
        tl[0] as i32,
        tl[1] as i32,
        (tr[0] - tl[0]) as i32,
        (bl[1] - tl[1]) as i32,
    );
    if rect.width <= 0 || rect.height <= 0 {
        return Err(ScreenMatchError::NumericalFailure(
            "projected outline is empty",
        ));
    }
    if !bounds.contains_rect(&rect) {
        return Err(ScreenMatchError::NumericalFailure(
            "projected outline leaves the source image",
        ));
    }
    Ok(rect)
}
