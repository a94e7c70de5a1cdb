//! High-level entry points bundling a backend with its configuration.

use crate::backend::{NativeBackend, VisionBackend};
use crate::config::FinderConfig;
use crate::features::FeatureAlgorithm;
use crate::geometry::Rect;
use crate::image::ImageView;
use crate::kernel::CorrelationMethod;
use crate::search::{correlation, keypoint, select, MatchResult};
use crate::util::ScreenMatchResult;

/// Template finder.
///
/// Stateless between calls: identical inputs give identical results.
#[derive(Clone, Debug, Default)]
pub struct Finder<B: VisionBackend = NativeBackend> {
    backend: B,
    config: FinderConfig,
}

impl Finder<NativeBackend> {
    /// Creates a finder over the native backend with default settings.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<B: VisionBackend> Finder<B> {
    /// Creates a finder over a custom backend.
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            config: FinderConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: FinderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Best placement of `template` with its confidence, without a threshold.
    pub fn locate(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        method: CorrelationMethod,
    ) -> ScreenMatchResult<MatchResult> {
        correlation::locate(&self.backend, source, template, method)
    }

    /// Correlation match of one template, failing with `NotFound` below
    /// `threshold`.
    pub fn match_one(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        method: CorrelationMethod,
        threshold: f32,
    ) -> ScreenMatchResult<MatchResult> {
        correlation::match_one(&self.backend, source, template, method, threshold)
    }

    /// Correlation match of one template inside `region` of the source.
    pub fn match_one_in(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        method: CorrelationMethod,
        threshold: f32,
        region: Option<Rect>,
    ) -> ScreenMatchResult<MatchResult> {
        correlation::match_one_in(&self.backend, source, template, method, threshold, region)
    }

    /// Best of several templates under the configured selection policy.
    pub fn match_best(
        &self,
        source: ImageView<'_, u8>,
        templates: &[ImageView<'_, u8>],
        method: CorrelationMethod,
        threshold: f32,
        region: Option<Rect>,
    ) -> ScreenMatchResult<MatchResult> {
        select::match_best(
            &self.backend,
            source,
            templates,
            method,
            threshold,
            region,
            self.config.selection,
        )
    }

    /// Keypoint match; `ratio` defaults to the configured match threshold.
    pub fn match_by_keypoints(
        &self,
        source: ImageView<'_, u8>,
        template: ImageView<'_, u8>,
        algorithm: FeatureAlgorithm,
        ratio: Option<f32>,
    ) -> ScreenMatchResult<MatchResult> {
        let ratio = ratio.unwrap_or(self.config.match_threshold);
        keypoint::match_by_keypoints(&self.backend, source, template, algorithm, ratio)
    }
}
