//! Sub-sample peak interpolation by parabola fitting.

/// Offset of the vertex of the parabola through `(-1, left)`, `(0, center)`
/// and `(1, right)`.
///
/// Only concave fits are accepted. Returns `None` for non-finite samples, a
/// flat or convex curve, or a vertex further than one sample from the centre.
pub(crate) fn parabola_vertex(left: f32, center: f32, right: f32) -> Option<f32> {
    let curvature = left - 2.0 * center + right;
    if !curvature.is_finite() || curvature > -1e-6 {
        return None;
    }
    let offset = 0.5 * (left - right) / curvature;
    (offset.is_finite() && offset.abs() <= 1.0).then_some(offset)
}

/// Sub-pixel position of a local maximum at `(x, y)`.
///
/// `patch[row][col]` holds the 3x3 neighbourhood with the peak in the middle.
/// Each axis is fitted independently; an axis whose fit is rejected keeps its
/// integer coordinate.
pub(crate) fn subpixel_peak(x: usize, y: usize, patch: [[f32; 3]; 3]) -> (f32, f32) {
    let row = &patch[1];
    let dx = parabola_vertex(row[0], row[1], row[2]).unwrap_or(0.0);
    let dy = parabola_vertex(patch[0][1], row[1], patch[2][1]).unwrap_or(0.0);
    (x as f32 + dx, y as f32 + dy)
}

#[cfg(test)]
mod tests {
    use super::{parabola_vertex, subpixel_peak};

    #[test]
    fn vertex_of_shifted_parabola() {
        let f = |x: f32| 4.0 - 2.0 * (x + 0.4).powi(2);
        let offset = parabola_vertex(f(-1.0), f(0.0), f(1.0)).unwrap();
        assert!((offset + 0.4).abs() < 1e-5);
    }

    #[test]
    fn convex_and_flat_fits_are_rejected() {
        assert!(parabola_vertex(2.0, 1.0, 2.0).is_none());
        assert!(parabola_vertex(1.0, 1.0, 1.0).is_none());
        assert!(parabola_vertex(f32::NAN, 1.0, 0.5).is_none());
    }

    #[test]
    fn subpixel_peak_recovers_both_axes() {
        let mut patch = [[0.0f32; 3]; 3];
        for (r, row) in patch.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                let (x, y) = (c as f32 - 1.0, r as f32 - 1.0);
                *cell = 10.0 - (x - 0.25).powi(2) - 3.0 * (y - 0.1).powi(2);
            }
        }
        let (fx, fy) = subpixel_peak(7, 3, patch);
        assert!((fx - 7.25).abs() < 1e-4);
        assert!((fy - 3.1).abs() < 1e-4);
    }

    #[test]
    fn subpixel_peak_keeps_integer_centre_when_flat() {
        assert_eq!(subpixel_peak(2, 5, [[1.0; 3]; 3]), (2.0, 5.0));
    }
}
