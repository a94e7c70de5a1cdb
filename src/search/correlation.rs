//! Single-template correlation matching.

use crate::backend::VisionBackend;
use crate::geometry::Rect;
use crate::image::ImageView;
use crate::kernel::CorrelationMethod;
use crate::search::{check_threshold, region_offset, MatchResult};
use crate::trace::trace_event;
use crate::util::{NotFound, ScreenMatchError, ScreenMatchResult};

/// Finds the best placement of `template` in `source` without a threshold.
///
/// Size and channel preconditions are checked before the backend is asked
/// for a surface. A surface without signal fails with `DegenerateMatch`.
pub fn locate<B: VisionBackend + ?Sized>(
    backend: &B,
    source: ImageView<'_, u8>,
    template: ImageView<'_, u8>,
    method: CorrelationMethod,
) -> ScreenMatchResult<MatchResult> {
    if template.width() > source.width() || template.height() > source.height() {
        return Err(ScreenMatchError::TemplateTooLarge {
            template_width: template.width(),
            template_height: template.height(),
            image_width: source.width(),
            image_height: source.height(),
        });
    }
    if template.channels() != source.channels() {
        return Err(ScreenMatchError::ChannelMismatch {
            image: source.channels(),
            template: template.channels(),
        });
    }

    let surface = backend.correlate(source, template, method)?;
    let extremum = surface
        .extremum()
        .ok_or(ScreenMatchError::NumericalFailure(
            "correlation surface has no finite score",
        ))?;
    if extremum.is_degenerate() {
        return Err(ScreenMatchError::DegenerateMatch);
    }

    let kernel = method.kernel();
    let (x, y) = kernel.best_location(&extremum);
    let element_count = template.width() * template.height() * template.channels();
    let confidence = kernel.confidence(&extremum, element_count);
    trace_event!(
        "correlation_peak",
        x = x,
        y = y,
        min = extremum.min_val,
        max = extremum.max_val,
        confidence = confidence
    );

    Ok(MatchResult::new(
        Rect::from_placement(x, y, template.width(), template.height()),
        confidence,
    ))
}

/// Locates `template` and requires `confidence >= threshold`.
pub fn match_one<B: VisionBackend + ?Sized>(
    backend: &B,
    source: ImageView<'_, u8>,
    template: ImageView<'_, u8>,
    method: CorrelationMethod,
    threshold: f32,
) -> ScreenMatchResult<MatchResult> {
    match_one_in(backend, source, template, method, threshold, None)
}

/// Like [`match_one`] but restricted to `region` of the source.
///
/// The returned rectangle is in absolute source coordinates.
pub fn match_one_in<B: VisionBackend + ?Sized>(
    backend: &B,
    source: ImageView<'_, u8>,
    template: ImageView<'_, u8>,
    method: CorrelationMethod,
    threshold: f32,
    region: Option<Rect>,
) -> ScreenMatchResult<MatchResult> {
    check_threshold(threshold)?;
    let area = source.region(region)?;
    let (dx, dy) = region_offset(region);

    let found = locate(backend, area, template, method)?.translated(dx, dy);
    if found.confidence() < threshold {
        return Err(ScreenMatchError::NotFound(NotFound {
            best_rect: Some(found.rect()),
            best_confidence: found.confidence(),
            threshold,
            tried: 1,
            region,
        }));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::{locate, match_one, match_one_in};
    use crate::backend::NativeBackend;
    use crate::geometry::Rect;
    use crate::kernel::CorrelationMethod;
    use crate::{ImageView, OwnedImage, ScreenMatchError};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(width: usize, height: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..width * height).map(|_| rng.random_range(0..=255)).collect()
    }

    #[test]
    fn crop_is_found_at_its_offset() {
        let img = noise(40, 30, 1);
        let source = ImageView::from_slice(&img, 40, 30).unwrap();
        let tpl = OwnedImage::from_view(source.roi(17, 9, 8, 6).unwrap()).unwrap();

        let found = match_one(
            &NativeBackend::default(),
            source,
            tpl.view(),
            CorrelationMethod::CCoeffNormed,
            0.99,
        )
        .unwrap();
        assert_eq!(found.rect(), Rect::new(17, 9, 8, 6));
        assert!(found.confidence() >= 0.99);
    }

    #[test]
    fn region_results_are_absolute() {
        let img = noise(40, 30, 2);
        let source = ImageView::from_slice(&img, 40, 30).unwrap();
        let tpl = OwnedImage::from_view(source.roi(20, 12, 6, 6).unwrap()).unwrap();

        let found = match_one_in(
            &NativeBackend::default(),
            source,
            tpl.view(),
            CorrelationMethod::SqDiffNormed,
            0.9,
            Some(Rect::new(15, 10, 20, 15)),
        )
        .unwrap();
        assert_eq!(found.rect(), Rect::new(20, 12, 6, 6));
    }

    #[test]
    fn oversized_template_is_invalid_input() {
        let img = noise(10, 10, 3);
        let big = noise(11, 4, 4);
        let source = ImageView::from_slice(&img, 10, 10).unwrap();
        let tpl = ImageView::from_slice(&big, 11, 4).unwrap();
        let err = locate(
            &NativeBackend::default(),
            source,
            tpl,
            CorrelationMethod::CCorrNormed,
        )
        .unwrap_err();
        assert!(matches!(err, ScreenMatchError::TemplateTooLarge { .. }));
        assert!(err.is_invalid_input());
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        let img = noise(10, 10, 5);
        let source = ImageView::from_slice(&img, 10, 10).unwrap();
        let tpl = source.roi(0, 0, 3, 3).unwrap();
        for threshold in [-0.1, 1.5, f32::NAN] {
            let err = match_one(
                &NativeBackend::default(),
                source,
                tpl,
                CorrelationMethod::CCoeffNormed,
                threshold,
            )
            .unwrap_err();
            assert!(err.is_invalid_input());
        }
    }
}
