//! Error types for screenmatch.

use crate::features::FeatureAlgorithm;
use crate::geometry::Rect;
use std::fmt;
use thiserror::Error;

/// Result alias for screenmatch operations.
pub type ScreenMatchResult<T> = std::result::Result<T, ScreenMatchError>;

/// Diagnostics for a search that completed without reaching the threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct NotFound {
    /// Best rectangle observed, in absolute source coordinates.
    pub best_rect: Option<Rect>,
    /// Best confidence observed (0 when nothing could be scored).
    pub best_confidence: f32,
    /// Threshold the caller asked for.
    pub threshold: f32,
    /// Number of templates tried.
    pub tried: usize,
    /// Search region, when the search was constrained to one.
    pub region: Option<Rect>,
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tried <= 1 {
            write!(f, "failed to find the template image")?;
        } else {
            write!(f, "failed to find one of {} template images", self.tried)?;
        }
        match self.region {
            Some(r) => write!(
                f,
                " in the source image at ({}, {}, {}, {})",
                r.x, r.y, r.width, r.height
            )?,
            None => write!(f, " in the source image")?,
        }
        write!(
            f,
            "; best confidence {:.2}, required {:.2}",
            self.best_confidence, self.threshold
        )
    }
}

/// Errors that can occur when running screenmatch algorithms.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ScreenMatchError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than one row of pixels.
    #[error("invalid stride {stride} for a row of {width} elements")]
    InvalidStride { width: usize, stride: usize },
    /// The backing slice is shorter than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region does not fit inside the image.
    #[error("region ({x}, {y}, {width}x{height}) is outside the {img_width}x{img_height} image")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Source and template use different channel layouts.
    #[error("channel mismatch: image has {image} channels, template has {template}")]
    ChannelMismatch { image: usize, template: usize },
    /// The template does not fit inside the search area.
    #[error(
        "template {template_width}x{template_height} is larger than the search area {image_width}x{image_height}"
    )]
    TemplateTooLarge {
        template_width: usize,
        template_height: usize,
        image_width: usize,
        image_height: usize,
    },
    /// The correlation surface carries no discriminating signal.
    #[error("correlation result is degenerate; the source is likely one solid color")]
    DegenerateMatch,
    /// The search completed but never reached the threshold.
    #[error("{0}")]
    NotFound(NotFound),
    /// The keypoint pipeline failed at some stage.
    #[error("keypoint matching with {algorithm} could not locate the template")]
    KeypointMatchFailed { algorithm: FeatureAlgorithm },
    /// Not enough correspondences to fit a model.
    #[error("too few correspondences: need {needed}, got {got}")]
    TooFewCorrespondences { needed: usize, got: usize },
    /// A numeric routine failed to produce a usable result.
    #[error("numerical failure: {0}")]
    NumericalFailure(&'static str),
    /// Image decoding, encoding, or file access failed.
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}

impl ScreenMatchError {
    /// Returns true for errors caused by unusable inputs rather than search outcomes.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::InvalidDimensions { .. }
                | Self::InvalidStride { .. }
                | Self::BufferTooSmall { .. }
                | Self::RoiOutOfBounds { .. }
                | Self::ChannelMismatch { .. }
                | Self::TemplateTooLarge { .. }
        )
    }

    /// Returns the not-found diagnostics, if this is a not-found outcome.
    pub fn not_found(&self) -> Option<&NotFound> {
        match self {
            Self::NotFound(report) => Some(report),
            _ => None,
        }
    }
}
