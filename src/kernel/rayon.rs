//! Row-parallel scan producing the same surface as the scalar scan.

use crate::kernel::{surface_size, window_stats, CorrelationKernel};
use crate::surface::CorrelationSurface;
use crate::template::CorrelationPlan;
use crate::util::ScreenMatchResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel equivalent of [`crate::kernel::scalar::correlate_scalar`].
///
/// Every placement is scored independently with the same arithmetic, so the
/// surface is bit-identical to the scalar one.
pub fn correlate_par(
    image: ImageView<'_, u8>,
    plan: &CorrelationPlan,
    kernel: &dyn CorrelationKernel,
) -> ScreenMatchResult<CorrelationSurface> {
    let (out_width, out_height) = surface_size(image, plan)?;

    let rows: Vec<Vec<f32>> = (0..out_height)
        .into_par_iter()
        .map(|y| -> ScreenMatchResult<Vec<f32>> {
            let mut row = Vec::with_capacity(out_width);
            for x in 0..out_width {
                let stats = window_stats(image, plan, x, y)?;
                row.push(kernel.score(&stats, plan));
            }
            Ok(row)
        })
        .collect::<ScreenMatchResult<_>>()?;

    let scores = rows.into_iter().flatten().collect();
    CorrelationSurface::new(out_width, out_height, scores)
}
