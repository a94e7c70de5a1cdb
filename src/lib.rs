//! ScreenMatch locates a template image inside a larger source image, such as
//! a screenshot captured during UI testing, and reports the bounding
//! rectangle and confidence of the match.
//!
//! Two strategies are offered: intensity correlation (six methods, single
//! template or best-of-N) and keypoint matching (SIFT- or ORB-style features
//! paired into a RANSAC homography). Vision primitives sit behind the
//! [`VisionBackend`] trait; [`NativeBackend`] is the built-in pure-Rust
//! implementation, with optional row parallelism via the `rayon` feature.
//!
//! ```no_run
//! use screenmatch::{CorrelationMethod, Finder, ImageView};
//!
//! # fn demo(screen: &[u8], button: &[u8]) -> screenmatch::ScreenMatchResult<()> {
//! let source = ImageView::from_slice(screen, 1280, 720)?;
//! let template = ImageView::from_slice(button, 64, 32)?;
//! let found = Finder::new().match_one(source, template, CorrelationMethod::CCoeffNormed, 0.9)?;
//! println!("{:?} at {:.2}", found.rect(), found.confidence());
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod candidate;
pub mod config;
pub mod features;
pub mod finder;
pub mod geometry;
pub mod homography;
pub mod image;
pub mod kernel;
pub mod lowlevel;
mod refine;
pub mod search;
pub mod surface;
pub mod template;
pub(crate) mod trace;
pub mod util;

pub use backend::{NativeBackend, NativeConfig, VisionBackend};
pub use config::FinderConfig;
pub use features::{
    DescriptorMatch, DescriptorPairing, Descriptors, FeatureAlgorithm, FeatureExtractor,
    Features, Keypoint, OrbConfig, SiftConfig,
};
pub use finder::Finder;
pub use geometry::Rect;
pub use homography::{Correspondence, Homography, RansacParams};
pub use image::{ImageView, OwnedImage};
pub use kernel::CorrelationMethod;
pub use search::{MatchResult, SelectionPolicy};
pub use surface::{CorrelationSurface, Extremum};
pub use util::{NotFound, ScreenMatchError, ScreenMatchResult};

#[cfg(feature = "image-io")]
pub use image::io;
#[cfg(feature = "image-io")]
pub use image::overlay;
