//! Template search strategies.
//!
//! `correlation` locates one template by intensity correlation, `select`
//! evaluates several templates against one source and `keypoint` locates a
//! template through descriptor matching and a fitted homography.

pub(crate) mod correlation;
pub(crate) mod keypoint;
pub(crate) mod select;

pub use select::SelectionPolicy;

use crate::geometry::Rect;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Located template: bounding rectangle in source coordinates and the
/// confidence of the match in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchResult {
    rect: Rect,
    confidence: f32,
}

impl MatchResult {
    pub fn new(rect: Rect, confidence: f32) -> Self {
        Self { rect, confidence }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub(crate) fn translated(self, dx: i32, dy: i32) -> Self {
        Self::new(self.rect.translated(dx, dy), self.confidence)
    }
}

/// Rejects thresholds that are not finite or lie outside `[0, 1]`.
pub(crate) fn check_threshold(threshold: f32) -> ScreenMatchResult<()> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(ScreenMatchError::InvalidInput(
            "threshold must be a finite value in [0, 1]",
        ))
    }
}

/// Offset that maps region-relative rectangles back to the source.
pub(crate) fn region_offset(region: Option<Rect>) -> (i32, i32) {
    region.map_or((0, 0), |r| (r.x, r.y))
}
