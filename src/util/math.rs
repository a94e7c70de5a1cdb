//! Angle helpers for keypoint orientations, all in degrees.

/// Maps an angle into `[0, 360)`.
pub(crate) fn wrap_deg_positive(angle_deg: f32) -> f32 {
    let wrapped = angle_deg.rem_euclid(360.0);
    // Tiny negative inputs round up to exactly 360.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Direction of the vector `(dx, dy)` in image coordinates, in `[0, 360)`.
pub(crate) fn direction_deg(dx: f32, dy: f32) -> f32 {
    wrap_deg_positive(dy.atan2(dx).to_degrees())
}

/// `(sin, cos)` of an angle.
pub(crate) fn sin_cos_deg(angle_deg: f32) -> (f32, f32) {
    angle_deg.to_radians().sin_cos()
}
