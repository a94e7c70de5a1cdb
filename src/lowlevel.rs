//! Low-level building blocks for custom matching pipelines.
//!
//! These expose the correlation kernels and scanners, the feature detectors
//! and the geometry routines that `NativeBackend` is assembled from. Most
//! users should prefer `Finder` or implement `VisionBackend` instead.

pub use crate::candidate::topk::{Peak, TopK};
pub use crate::features::fast::detect_fast9;
pub use crate::features::matching::hamming;
pub use crate::features::scale_space::GrayF32;
pub use crate::homography::{fit_homography_ransac, RansacFit};
pub use crate::image::pyramid::{to_gray, ImagePyramid};
pub use crate::kernel::scalar::correlate_scalar;
pub use crate::kernel::{CorrelationKernel, Polarity, WindowStats};
pub use crate::template::CorrelationPlan;

#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::correlate_par;
