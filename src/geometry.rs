//! Integer rectangles in image pixel coordinates.

use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Axis-aligned rectangle with its top-left corner at `(x, y)`.
///
/// Coordinates are signed so that search regions and projected keypoint
/// outlines can be checked against the image before they are accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from unsigned placement coordinates.
    pub(crate) fn from_placement(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self::new(
            saturate_i32(x),
            saturate_i32(y),
            saturate_i32(width),
            saturate_i32(height),
        )
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Returns the rectangle shifted by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Returns true when `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Converts to unsigned ROI bounds, rejecting negative or empty extents.
    pub(crate) fn to_roi(self) -> ScreenMatchResult<(usize, usize, usize, usize)> {
        if self.x < 0 || self.y < 0 {
            return Err(ScreenMatchError::InvalidInput(
                "search region starts at a negative coordinate",
            ));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(ScreenMatchError::InvalidDimensions {
                width: self.width.max(0) as usize,
                height: self.height.max(0) as usize,
            });
        }
        Ok((
            self.x as usize,
            self.y as usize,
            self.width as usize,
            self.height as usize,
        ))
    }
}

fn saturate_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
