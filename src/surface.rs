//! Correlation surfaces and their extremum search.

use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Dense grid of scores, one per template placement (top-left corner).
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationSurface {
    width: usize,
    height: usize,
    scores: Vec<f32>,
}

/// Minimum and maximum of a surface with their first locations in row-major order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extremum {
    pub min_val: f32,
    pub max_val: f32,
    pub min_loc: (usize, usize),
    pub max_loc: (usize, usize),
}

impl Extremum {
    /// True when the surface carries no discriminating signal.
    ///
    /// This is the signature a solid-colour source leaves on the normalized
    /// methods: every placement scores exactly 1 so both extrema sit at the
    /// origin.
    pub fn is_degenerate(&self) -> bool {
        self.min_val == 1.0
            && self.max_val == 1.0
            && self.min_loc == (0, 0)
            && self.max_loc == (0, 0)
    }
}

impl CorrelationSurface {
    /// Wraps a row-major score buffer.
    pub fn new(width: usize, height: usize, scores: Vec<f32>) -> ScreenMatchResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScreenMatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(ScreenMatchError::InvalidDimensions { width, height })?;
        if scores.len() != needed {
            return Err(ScreenMatchError::BufferTooSmall {
                needed,
                got: scores.len(),
            });
        }
        Ok(Self {
            width,
            height,
            scores,
        })
    }

    /// Creates a surface where every placement has the same score.
    pub fn filled(width: usize, height: usize, value: f32) -> ScreenMatchResult<Self> {
        Self::new(width, height, vec![value; width.saturating_mul(height)])
    }

    /// Number of placements along x.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of placements along y.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major scores.
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Score at placement `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// Finds the extrema, keeping the first occurrence on ties.
    ///
    /// Non-finite scores are skipped; `None` means nothing finite was found.
    pub fn extremum(&self) -> Option<Extremum> {
        let mut out: Option<Extremum> = None;
        for (idx, &score) in self.scores.iter().enumerate() {
            if !score.is_finite() {
                continue;
            }
            let loc = (idx % self.width, idx / self.width);
            let ext = out.get_or_insert(Extremum {
                min_val: score,
                max_val: score,
                min_loc: loc,
                max_loc: loc,
            });
            if score < ext.min_val {
                ext.min_val = score;
                ext.min_loc = loc;
            }
            if score > ext.max_val {
                ext.max_val = score;
                ext.max_loc = loc;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::CorrelationSurface;

    #[test]
    fn extremum_keeps_first_occurrence() {
        let surface =
            CorrelationSurface::new(3, 2, vec![0.5, 0.9, 0.1, 0.9, 0.1, 0.3]).unwrap();
        let ext = surface.extremum().unwrap();
        assert_eq!(ext.max_loc, (1, 0));
        assert_eq!(ext.min_loc, (2, 0));
        assert!((ext.max_val - 0.9).abs() < 1e-6);
        assert!(!ext.is_degenerate());
    }

    #[test]
    fn uniform_ones_are_degenerate() {
        let surface = CorrelationSurface::filled(4, 3, 1.0).unwrap();
        let ext = surface.extremum().unwrap();
        assert!(ext.is_degenerate());

        let surface = CorrelationSurface::filled(4, 3, 0.5).unwrap();
        assert!(!surface.extremum().unwrap().is_degenerate());
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(CorrelationSurface::new(2, 2, vec![0.0; 3]).is_err());
        assert!(CorrelationSurface::new(0, 2, Vec::new()).is_err());
    }

    #[test]
    fn skips_non_finite_scores() {
        let surface = CorrelationSurface::new(2, 1, vec![f32::NAN, 0.25]).unwrap();
        let ext = surface.extremum().unwrap();
        assert_eq!(ext.min_loc, (1, 0));
        assert_eq!(ext.max_loc, (1, 0));
    }
}
