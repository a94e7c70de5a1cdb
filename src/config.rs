//! Facade configuration.

use crate::search::SelectionPolicy;
use crate::util::{ScreenMatchError, ScreenMatchResult};

/// Defaults applied by [`crate::Finder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinderConfig {
    /// Default confidence threshold for correlation matching and default
    /// ratio for the keypoint ratio test.
    pub match_threshold: f32,
    /// Selection policy of the multi-template search.
    pub selection: SelectionPolicy,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.8,
            selection: SelectionPolicy::FirstQualifying,
        }
    }
}

impl FinderConfig {
    /// Checks that `match_threshold` is a finite value in `[0, 1]`.
    pub fn validate(&self) -> ScreenMatchResult<()> {
        if self.match_threshold.is_finite() && (0.0..=1.0).contains(&self.match_threshold) {
            Ok(())
        } else {
            Err(ScreenMatchError::InvalidInput(
                "match_threshold must be a finite value in [0, 1]",
            ))
        }
    }

    /// Returns a copy with a different threshold.
    pub fn with_match_threshold(mut self, threshold: f32) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Returns a copy with a different selection policy.
    pub fn with_selection(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }
}
