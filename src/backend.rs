//! Vision primitives consumed by the matchers.
//!
//! The matchers only talk to a [`VisionBackend`], so their selection,
//! threshold and error logic can run against a deterministic fake.
//! [`NativeBackend`] is the pure-Rust implementation shipped with the crate.

use crate::features::{
    self, DescriptorMatch, Descriptors, FeatureAlgorithm, FeatureExtractor, Features, OrbConfig,
    OrbExtractor, SiftConfig, SiftExtractor,
};
use crate::homography::{fit_homography_ransac, Correspondence, Homography, RansacParams};
use crate::image::ImageView;
use crate::kernel::{scalar, CorrelationMethod};
use crate::surface::CorrelationSurface;
use crate::template::CorrelationPlan;
use crate::trace::trace_span;
use crate::util::ScreenMatchResult;

/// Capability interface for correlation, features and geometry.
pub trait VisionBackend {
    /// Dense correlation surface of `template` over `source`.
    fn correlate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        method: CorrelationMethod,
    ) -> ScreenMatchResult<CorrelationSurface>;

    /// Detects keypoints and computes their descriptors.
    fn detect_and_describe(
        &self,
        image: ImageView<'_, u8>,
        algorithm: FeatureAlgorithm,
    ) -> ScreenMatchResult<Features>;

    /// `k` nearest train descriptors per query descriptor, closest first.
    fn knn_match(
        &self,
        query: &Descriptors,
        train: &Descriptors,
        k: usize,
    ) -> ScreenMatchResult<Vec<Vec<DescriptorMatch>>> {
        features::knn_match(query, train, k)
    }

    /// Mutual nearest-neighbour pairs.
    fn cross_check_match(
        &self,
        query: &Descriptors,
        train: &Descriptors,
    ) -> ScreenMatchResult<Vec<DescriptorMatch>> {
        features::cross_check_match(query, train)
    }

    /// Robust template-to-source homography.
    fn fit_homography(
        &self,
        pairs: &[Correspondence],
        params: &RansacParams,
    ) -> ScreenMatchResult<Homography> {
        fit_homography_ransac(pairs, params).map(|fit| fit.homography)
    }

    /// Maps points through `homography`.
    fn project(
        &self,
        points: &[[f64; 2]],
        homography: &Homography,
    ) -> ScreenMatchResult<Vec<[f64; 2]>> {
        homography.project(points)
    }
}

/// Settings of the native backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeConfig {
    /// Scan correlation rows in parallel (needs the `rayon` feature).
    pub parallel: bool,
    pub orb: OrbConfig,
    pub sift: SiftConfig,
}

/// Pure-Rust vision backend.
#[derive(Clone, Debug)]
pub struct NativeBackend {
    config: NativeConfig,
    orb: OrbExtractor,
    sift: SiftExtractor,
}

impl NativeBackend {
    pub fn new(config: NativeConfig) -> Self {
        let orb = OrbExtractor::new(config.orb.clone());
        let sift = SiftExtractor::new(config.sift.clone());
        Self { config, orb, sift }
    }

    pub fn config(&self) -> &NativeConfig {
        &self.config
    }

    /// Extractor implementing `algorithm`.
    pub fn extractor(&self, algorithm: FeatureAlgorithm) -> &dyn FeatureExtractor {
        match algorithm {
            FeatureAlgorithm::Sift => &self.sift,
            FeatureAlgorithm::Orb => &self.orb,
        }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new(NativeConfig::default())
    }
}

impl VisionBackend for NativeBackend {
    fn correlate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        method: CorrelationMethod,
    ) -> ScreenMatchResult<CorrelationSurface> {
        let _span = trace_span!(
            "correlate",
            method = method.kernel().name(),
            parallel = self.config.parallel
        )
        .entered();
        let plan = CorrelationPlan::from_view(template)?;
        let kernel = method.kernel();

        #[cfg(feature = "rayon")]
        if self.config.parallel {
            return crate::kernel::rayon::correlate_par(source, &plan, kernel);
        }

        scalar::correlate_scalar(source, &plan, kernel)
    }

    fn detect_and_describe(
        &self,
        image: ImageView<'_, u8>,
        algorithm: FeatureAlgorithm,
    ) -> ScreenMatchResult<Features> {
        let _span = trace_span!(
            "detect_and_describe",
            algorithm = %algorithm,
            width = image.width(),
            height = image.height()
        )
        .entered();
        self.extractor(algorithm).detect_and_describe(image)
    }
}
