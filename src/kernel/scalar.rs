//! Scalar reference scan producing a dense correlation surface.

use crate::kernel::{surface_size, window_stats, CorrelationKernel};
use crate::surface::CorrelationSurface;
use crate::template::CorrelationPlan;
use crate::util::ScreenMatchResult;
use crate::ImageView;

/// Scores every placement of `plan` in `image` with `kernel`.
///
/// The surface has `(W − w + 1) × (H − h + 1)` entries in row-major order.
pub fn correlate_scalar(
    image: ImageView<'_, u8>,
    plan: &CorrelationPlan,
    kernel: &dyn CorrelationKernel,
) -> ScreenMatchResult<CorrelationSurface> {
    let (out_width, out_height) = surface_size(image, plan)?;
    let mut scores = Vec::with_capacity(out_width * out_height);
    for y in 0..out_height {
        for x in 0..out_width {
            let stats = window_stats(image, plan, x, y)?;
            scores.push(kernel.score(&stats, plan));
        }
    }
    CorrelationSurface::new(out_width, out_height, scores)
}
