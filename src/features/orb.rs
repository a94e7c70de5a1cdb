//! ORB-style features: FAST-9 corners on an image pyramid, intensity-centroid
//! orientation and a 256-bit rotated BRIEF descriptor.

use crate::candidate::topk::{Peak, TopK};
use crate::features::fast::detect_fast9;
use crate::features::scale_space::GrayF32;
use crate::features::{
    BinaryDescriptor, Descriptors, FeatureAlgorithm, FeatureExtractor, Features, Keypoint,
};
use crate::image::pyramid::{to_gray, ImagePyramid};
use crate::image::ImageView;
use crate::trace::trace_event;
use crate::util::math::{direction_deg, sin_cos_deg};
use crate::util::ScreenMatchResult;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Half-size of the square the BRIEF sampling pattern is drawn from.
const PATTERN_EXTENT: i32 = 13;
const DESCRIPTOR_BITS: usize = 256;
const PATCH_SIZE: f32 = 31.0;

/// ORB extractor parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbConfig {
    /// Keypoints kept over all pyramid levels; `0` keeps all.
    pub max_features: usize,
    /// Number of pyramid levels (each one half the size of the previous).
    pub levels: usize,
    /// FAST intensity threshold.
    pub fast_threshold: u8,
    /// Minimum distance from the level border for detected corners.
    pub edge_border: usize,
    /// Radius of the intensity-centroid patch.
    pub patch_radius: usize,
    /// Gaussian sigma applied before sampling the descriptor.
    pub blur_sigma: f32,
    /// Seed of the BRIEF sampling pattern.
    pub pattern_seed: u64,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            levels: 4,
            fast_threshold: 20,
            edge_border: 24,
            patch_radius: 15,
            blur_sigma: 2.0,
            pattern_seed: 0x5eed_0bb5,
        }
    }
}

/// ORB detector and descriptor.
#[derive(Clone, Debug)]
pub struct OrbExtractor {
    config: OrbConfig,
    pattern: Vec<[(f32, f32); 2]>,
}

impl OrbExtractor {
    /// Creates an extractor and draws its sampling pattern.
    pub fn new(config: OrbConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.pattern_seed);
        let mut draw = || {
            (
                rng.random_range(-PATTERN_EXTENT..=PATTERN_EXTENT) as f32,
                rng.random_range(-PATTERN_EXTENT..=PATTERN_EXTENT) as f32,
            )
        };
        let pattern = (0..DESCRIPTOR_BITS).map(|_| [draw(), draw()]).collect();
        Self { config, pattern }
    }

    /// Returns the extractor parameters.
    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    fn border(&self) -> usize {
        // Rotated pattern points reach PATTERN_EXTENT * sqrt(2) from the center.
        let pattern_reach = (PATTERN_EXTENT as f32 * std::f32::consts::SQRT_2).ceil() as usize + 1;
        self.config
            .edge_border
            .max(self.config.patch_radius + 1)
            .max(pattern_reach)
    }

    fn orientation(&self, level: &GrayF32, x: usize, y: usize) -> f32 {
        let r = self.config.patch_radius as isize;
        let mut m01 = 0.0f32;
        let mut m10 = 0.0f32;
        for dy in -r..=r {
            let span = ((r * r - dy * dy) as f32).sqrt() as isize;
            for dx in -span..=span {
                let v = level.at_clamped(x as isize + dx, y as isize + dy);
                m10 += dx as f32 * v;
                m01 += dy as f32 * v;
            }
        }
        direction_deg(m10, m01)
    }

    fn describe(&self, smoothed: &GrayF32, x: usize, y: usize, angle: f32) -> BinaryDescriptor {
        let (sin, cos) = sin_cos_deg(angle);
        let sample = |(px, py): (f32, f32)| {
            let rx = (px * cos - py * sin).round() as isize;
            let ry = (px * sin + py * cos).round() as isize;
            smoothed.at_clamped(x as isize + rx, y as isize + ry)
        };
        let mut out = [0u8; DESCRIPTOR_BITS / 8];
        for (bit, pair) in self.pattern.iter().enumerate() {
            if sample(pair[0]) < sample(pair[1]) {
                out[bit / 8] |= 1 << (bit % 8);
            }
        }
        out
    }
}

impl Default for OrbExtractor {
    fn default() -> Self {
        Self::new(OrbConfig::default())
    }
}

/// Splits `total` across `levels` in proportion to each level's area.
/// A zero `total` leaves every level unbounded.
fn level_quotas(total: usize, levels: usize) -> Vec<usize> {
    if total == 0 {
        return vec![usize::MAX; levels];
    }
    let weights: Vec<f64> = (0..levels).map(|l| 0.25f64.powi(l as i32)).collect();
    let sum: f64 = weights.iter().sum();
    weights
        .iter()
        .map(|w| ((total as f64 * w / sum).round() as usize).max(1))
        .collect()
}

impl FeatureExtractor for OrbExtractor {
    fn algorithm(&self) -> FeatureAlgorithm {
        FeatureAlgorithm::Orb
    }

    fn detect_and_describe(&self, image: ImageView<'_, u8>) -> ScreenMatchResult<Features> {
        let gray = to_gray(image)?;
        let pyramid = ImagePyramid::build_u8(gray.view(), self.config.levels)?;
        let border = self.border();
        let quotas = level_quotas(self.config.max_features, pyramid.levels().len());

        let mut keypoints = Vec::new();
        let mut descriptors = Vec::new();
        for (level, owned) in pyramid.levels().iter().enumerate() {
            let view = owned.view();
            let mut topk = TopK::new(quotas[level]);
            for corner in detect_fast9(view, self.config.fast_threshold, border, level)? {
                topk.push(corner);
            }
            let retained: Vec<Peak> = topk.into_sorted_desc();
            if retained.is_empty() {
                continue;
            }

            let plain = GrayF32::from_view(view)?;
            let smoothed = plain.gaussian_blur(self.config.blur_sigma);
            let scale = (1u32 << level) as f32;
            for peak in retained {
                let angle = self.orientation(&plain, peak.x, peak.y);
                let (bx, by) = ImagePyramid::to_base(level, peak.x as f32, peak.y as f32);
                keypoints.push(Keypoint {
                    x: bx,
                    y: by,
                    size: PATCH_SIZE * scale,
                    angle,
                    response: peak.score,
                    octave: level as i32,
                });
                descriptors.push(self.describe(&smoothed, peak.x, peak.y, angle));
            }
        }

        trace_event!("orb_features", keypoints = keypoints.len());
        Ok(Features {
            keypoints,
            descriptors: Descriptors::Binary(descriptors),
        })
    }
}
