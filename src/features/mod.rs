//! Keypoint detection, description and descriptor matching.

pub mod fast;
pub mod matching;
pub mod orb;
pub mod scale_space;
pub mod sift;

pub use matching::{cross_check_match, knn_match};
pub use orb::{OrbConfig, OrbExtractor};
pub use sift::{SiftConfig, SiftExtractor};

use crate::image::ImageView;
use crate::util::ScreenMatchResult;
use std::fmt;

/// Keypoint algorithm used by the keypoint matcher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FeatureAlgorithm {
    /// Difference-of-Gaussians keypoints with 128-d float descriptors.
    #[default]
    Sift,
    /// FAST keypoints with 256-bit binary descriptors.
    Orb,
}

impl FeatureAlgorithm {
    /// How descriptors of this algorithm are paired between two images.
    pub fn pairing(self) -> DescriptorPairing {
        match self {
            FeatureAlgorithm::Sift => DescriptorPairing::KnnRatio,
            FeatureAlgorithm::Orb => DescriptorPairing::CrossCheck,
        }
    }
}

impl fmt::Display for FeatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureAlgorithm::Sift => f.write_str("SIFT"),
            FeatureAlgorithm::Orb => f.write_str("ORB"),
        }
    }
}

/// Descriptor pairing strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorPairing {
    /// Two nearest neighbours filtered by the ratio test.
    KnnRatio,
    /// Mutual nearest neighbours, all kept.
    CrossCheck,
}

/// Detected keypoint in base-image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Diameter of the described neighbourhood.
    pub size: f32,
    /// Orientation in degrees, `[0, 360)`.
    pub angle: f32,
    /// Detector response.
    pub response: f32,
    /// Pyramid level or octave the keypoint was found on.
    pub octave: i32,
}

/// 256-bit binary descriptor.
pub type BinaryDescriptor = [u8; 32];

/// Descriptors aligned with a keypoint list.
#[derive(Clone, Debug, PartialEq)]
pub enum Descriptors {
    /// `dim` floats per keypoint, stored contiguously.
    Float { dim: usize, data: Vec<f32> },
    /// One binary descriptor per keypoint.
    Binary(Vec<BinaryDescriptor>),
}

impl Descriptors {
    /// Number of descriptors.
    pub fn len(&self) -> usize {
        match self {
            Descriptors::Float { dim, data } => {
                if *dim == 0 {
                    0
                } else {
                    data.len() / dim
                }
            }
            Descriptors::Binary(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keypoints and their descriptors.
#[derive(Clone, Debug, PartialEq)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Descriptors,
}

/// A query descriptor paired with a train descriptor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescriptorMatch {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Detects keypoints and computes their descriptors.
pub trait FeatureExtractor: Send + Sync {
    /// Algorithm implemented by this extractor.
    fn algorithm(&self) -> FeatureAlgorithm;

    /// Runs detection and description on `image` (any channel count).
    fn detect_and_describe(&self, image: ImageView<'_, u8>) -> ScreenMatchResult<Features>;
}
