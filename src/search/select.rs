//! Best-of-N template selection.

use crate::backend::VisionBackend;
use crate::geometry::Rect;
use crate::image::ImageView;
use crate::kernel::CorrelationMethod;
use crate::search::correlation::locate;
use crate::search::{check_threshold, region_offset, MatchResult};
use crate::trace::{trace_error, trace_event, trace_span, trace_warn};
use crate::util::{NotFound, ScreenMatchError, ScreenMatchResult};

/// How the selector picks among several qualifying templates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionPolicy {
    /// Stop at the first template, in input order, that qualifies.
    #[default]
    FirstQualifying,
    /// Score every template and keep the most confident qualifying one.
    GlobalBest,
}

/// Evaluates `templates` in order against `source` (or `region` of it).
///
/// A template is adopted when its confidence strictly exceeds the best
/// adopted so far (initially 0) and reaches `threshold`. Templates that fail
/// to score are logged and skipped.
pub fn match_best<B: VisionBackend + ?Sized>(
    backend: &B,
    source: ImageView<'_, u8>,
    templates: &[ImageView<'_, u8>],
    method: CorrelationMethod,
    threshold: f32,
    region: Option<Rect>,
    policy: SelectionPolicy,
) -> ScreenMatchResult<MatchResult> {
    check_threshold(threshold)?;
    if templates.is_empty() {
        return Err(ScreenMatchError::InvalidInput(
            "at least one template is required",
        ));
    }
    let area = source.region(region)?;
    let (dx, dy) = region_offset(region);

    let _span = trace_span!(
        "match_best",
        templates = templates.len(),
        method = method.kernel().name()
    )
    .entered();

    let mut adopted: Option<MatchResult> = None;
    let mut observed: Option<MatchResult> = None;
    for (index, template) in templates.iter().enumerate() {
        let candidate = match locate(backend, area, *template, method) {
            Ok(found) => found.translated(dx, dy),
            Err(err @ ScreenMatchError::TemplateTooLarge { .. }) => {
                trace_error!("template {} does not fit the search area: {}", index, err);
                continue;
            }
            Err(err) => {
                trace_warn!("template {} could not be scored: {}", index, err);
                continue;
            }
        };
        let confidence = candidate.confidence();
        trace_event!("candidate_scored", index = index, confidence = confidence);

        if observed.map_or(true, |o| confidence > o.confidence()) {
            observed = Some(candidate);
        }
        let best = adopted.map_or(0.0, |a| a.confidence());
        if confidence > best && confidence >= threshold {
            adopted = Some(candidate);
            if policy == SelectionPolicy::FirstQualifying {
                break;
            }
        }
    }

    adopted.ok_or_else(|| {
        ScreenMatchError::NotFound(NotFound {
            best_rect: observed.map(|o| o.rect()),
            best_confidence: observed.map_or(0.0, |o| o.confidence()),
            threshold,
            tried: templates.len(),
            region,
        })
    })
}
