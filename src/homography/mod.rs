//! Planar homographies: normalized DLT estimation, projection and robust
//! RANSAC fitting.

use crate::util::{ScreenMatchError, ScreenMatchResult};
use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};

pub mod ransac;

pub use ransac::{fit_homography_ransac, RansacFit, RansacParams};

const MIN_POINTS: usize = 4;

/// Point pair mapping template coordinates to source coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Correspondence {
    pub src: [f64; 2],
    pub dst: [f64; 2],
}

impl Correspondence {
    pub fn new(src: [f64; 2], dst: [f64; 2]) -> Self {
        Self { src, dst }
    }
}

/// 3x3 perspective transform normalized so that `h[2][2] == 1` when possible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    matrix: Matrix3<f64>,
}

impl Homography {
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self { matrix }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    /// Pure translation by `(tx, ty)`.
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Maps one point; `None` when it lands on the line at infinity.
    pub fn apply(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let v = self.matrix * Vector3::new(p[0], p[1], 1.0);
        if v[2].abs() < 1e-12 {
            return None;
        }
        let out = [v[0] / v[2], v[1] / v[2]];
        (out[0].is_finite() && out[1].is_finite()).then_some(out)
    }

    /// Maps every point, failing if any of them cannot be projected.
    pub fn project(&self, points: &[[f64; 2]]) -> ScreenMatchResult<Vec<[f64; 2]>> {
        points
            .iter()
            .map(|&p| {
                self.apply(p)
                    .ok_or(ScreenMatchError::NumericalFailure("point maps to infinity"))
            })
            .collect()
    }

    /// Distance between the projection of `c.src` and `c.dst`.
    pub fn reprojection_error(&self, c: &Correspondence) -> f64 {
        match self.apply(c.src) {
            Some(p) => ((p[0] - c.dst[0]).powi(2) + (p[1] - c.dst[1]).powi(2)).sqrt(),
            None => f64::INFINITY,
        }
    }

    /// Direct linear transform from at least four correspondences.
    ///
    /// Points are Hartley-normalized on both sides; the solution is the
    /// eigenvector of `AᵀA` with the smallest eigenvalue.
    pub fn from_correspondences(pairs: &[Correspondence]) -> ScreenMatchResult<Self> {
        let n = pairs.len();
        if n < MIN_POINTS {
            return Err(ScreenMatchError::TooFewCorrespondences {
                needed: MIN_POINTS,
                got: n,
            });
        }

        let src: Vec<[f64; 2]> = pairs.iter().map(|c| c.src).collect();
        let dst: Vec<[f64; 2]> = pairs.iter().map(|c| c.dst).collect();
        let (t_src, src_n) = normalize_points(&src);
        let (t_dst, dst_n) = normalize_points(&dst);

        let mut a = DMatrix::zeros(2 * n, 9);
        for i in 0..n {
            let (sx, sy) = (src_n[i][0], src_n[i][1]);
            let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

            a[(2 * i, 3)] = -sx;
            a[(2 * i, 4)] = -sy;
            a[(2 * i, 5)] = -1.0;
            a[(2 * i, 6)] = dy * sx;
            a[(2 * i, 7)] = dy * sy;
            a[(2 * i, 8)] = dy;

            a[(2 * i + 1, 0)] = sx;
            a[(2 * i + 1, 1)] = sy;
            a[(2 * i + 1, 2)] = 1.0;
            a[(2 * i + 1, 6)] = -dx * sx;
            a[(2 * i + 1, 7)] = -dx * sy;
            a[(2 * i + 1, 8)] = -dx;
        }

        let eig = SymmetricEigen::new(a.transpose() * &a);
        let mut min_idx = 0;
        for i in 1..9 {
            if eig.eigenvalues[i].abs() < eig.eigenvalues[min_idx].abs() {
                min_idx = i;
            }
        }
        let h = |j: usize| eig.eigenvectors[(j, min_idx)];
        let h_norm = Matrix3::new(h(0), h(1), h(2), h(3), h(4), h(5), h(6), h(7), h(8));

        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or(ScreenMatchError::NumericalFailure(
                "destination normalization is singular",
            ))?;
        let mut matrix = t_dst_inv * h_norm * t_src;
        let scale = matrix[(2, 2)];
        if scale.abs() > 1e-15 {
            matrix /= scale;
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(ScreenMatchError::NumericalFailure(
                "homography has non-finite entries",
            ));
        }
        Ok(Self::new(matrix))
    }
}

/// Translates the centroid to the origin and scales the mean distance to √2.
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    (t, normalized)
}

#[cfg(test)]
mod tests {
    use super::{Correspondence, Homography};
    use nalgebra::Matrix3;

    fn perspective() -> Homography {
        Homography::new(Matrix3::new(
            1.1, 0.05, 30.0, -0.03, 0.95, 12.0, 1e-4, -2e-4, 1.0,
        ))
    }

    #[test]
    fn dlt_recovers_known_homography() {
        let truth = perspective();
        let pairs: Vec<Correspondence> = [
            [0.0, 0.0],
            [100.0, 0.0],
            [100.0, 80.0],
            [0.0, 80.0],
            [50.0, 40.0],
            [20.0, 70.0],
        ]
        .iter()
        .map(|&p| Correspondence::new(p, truth.apply(p).unwrap()))
        .collect();

        let fitted = Homography::from_correspondences(&pairs).unwrap();
        for c in &pairs {
            assert!(fitted.reprojection_error(c) < 1e-6);
        }
    }

    #[test]
    fn dlt_needs_four_points() {
        let pairs = vec![Correspondence::new([0.0, 0.0], [1.0, 1.0]); 3];
        assert!(Homography::from_correspondences(&pairs).is_err());
    }

    #[test]
    fn project_maps_translation() {
        let h = Homography::translation(5.0, -3.0);
        let pts = h.project(&[[0.0, 0.0], [10.0, 20.0]]).unwrap();
        assert_eq!(pts, vec![[5.0, -3.0], [15.0, 17.0]]);
    }

    #[test]
    fn point_at_infinity_fails_projection() {
        let h = Homography::new(Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0));
        assert!(h.apply([0.0, 5.0]).is_none());
        assert!(h.project(&[[0.0, 5.0]]).is_err());
    }
}
