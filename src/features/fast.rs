//! FAST-9 segment-test corner detection with 3x3 non-maximum suppression.
//!
//! A pixel is a corner when at least 9 contiguous pixels on the radius-3
//! Bresenham circle are all brighter than `p + t` or all darker than `p − t`.
//! The corner score is the summed absolute excess over the threshold of the
//! winning class.

use crate::candidate::topk::Peak;
use crate::image::ImageView;
use crate::util::{ScreenMatchError, ScreenMatchResult};

const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

const ARC_LEN: usize = 9;

/// Detects FAST-9 corners at least `border` pixels away from the edges.
///
/// Returned peaks carry `level` unchanged and are in raster order.
pub fn detect_fast9(
    image: ImageView<'_, u8>,
    threshold: u8,
    border: usize,
    level: usize,
) -> ScreenMatchResult<Vec<Peak>> {
    if image.channels() != 1 {
        return Err(ScreenMatchError::InvalidInput(
            "corner detection needs a single-channel image",
        ));
    }
    let border = border.max(3);
    let width = image.width();
    let height = image.height();
    if width <= 2 * border || height <= 2 * border {
        return Ok(Vec::new());
    }

    let mut scores = vec![0.0f32; width * height];
    for y in border..height - border {
        for x in border..width - border {
            scores[y * width + x] = segment_score(image, x, y, threshold);
        }
    }

    let mut corners = Vec::new();
    for y in border..height - border {
        for x in border..width - border {
            let idx = y * width + x;
            let score = scores[idx];
            if score > 0.0 && is_local_max(&scores, width, x, y) {
                corners.push(Peak { x, y, score, level });
            }
        }
    }
    Ok(corners)
}

fn segment_score(image: ImageView<'_, u8>, x: usize, y: usize, threshold: u8) -> f32 {
    let data = image.as_slice();
    let stride = image.stride() as isize;
    let center_idx = y as isize * stride + x as isize;
    let p = i32::from(data[center_idx as usize]);
    let t = i32::from(threshold);

    let mut ring = [0i32; 16];
    for (value, &(dx, dy)) in ring.iter_mut().zip(CIRCLE.iter()) {
        *value = i32::from(data[(center_idx + dy * stride + dx) as usize]);
    }

    let bright = |v: i32| v > p + t;
    let dark = |v: i32| v < p - t;
    if !has_arc(&ring, bright) && !has_arc(&ring, dark) {
        return 0.0;
    }

    let mut bright_sum = 0i32;
    let mut dark_sum = 0i32;
    for &v in &ring {
        if bright(v) {
            bright_sum += v - p - t;
        } else if dark(v) {
            dark_sum += p - t - v;
        }
    }
    bright_sum.max(dark_sum) as f32
}

fn has_arc(ring: &[i32; 16], pred: impl Fn(i32) -> bool) -> bool {
    let mut run = 0usize;
    for i in 0..ring.len() + ARC_LEN - 1 {
        if pred(ring[i % ring.len()]) {
            run += 1;
            if run >= ARC_LEN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

// Ties go to the earlier pixel in raster order.
fn is_local_max(scores: &[f32], width: usize, x: usize, y: usize) -> bool {
    let idx = y * width + x;
    let score = scores[idx];
    for dy in -1isize..=1 {
        for dx in -1isize..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let n_idx = ((y as isize + dy) as usize) * width + (x as isize + dx) as usize;
            let n = scores[n_idx];
            if n > score || (n == score && n_idx < idx) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::detect_fast9;
    use crate::ImageView;

    #[test]
    fn bright_square_corner_is_detected() {
        let (w, h) = (32usize, 32usize);
        let mut img = vec![20u8; w * h];
        for y in 12..h {
            for x in 12..w {
                img[y * w + x] = 220;
            }
        }
        let view = ImageView::from_slice(&img, w, h).unwrap();
        let corners = detect_fast9(view, 20, 4, 0).unwrap();
        assert!(!corners.is_empty());
        assert!(corners
            .iter()
            .any(|c| c.x.abs_diff(12) <= 1 && c.y.abs_diff(12) <= 1));
        // Straight edges far from the corner are not segment-test corners.
        assert!(corners.iter().all(|c| c.x < 16 && c.y < 16));
    }

    #[test]
    fn flat_image_has_no_corners() {
        let img = vec![128u8; 40 * 40];
        let view = ImageView::from_slice(&img, 40, 40).unwrap();
        assert!(detect_fast9(view, 20, 3, 0).unwrap().is_empty());
    }
}
