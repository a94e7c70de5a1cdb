//! SIFT-style features: difference-of-Gaussians extrema over a float scale
//! space, gradient-histogram orientation and a 4x4x8 gradient descriptor.
//!
//! Samples keep the `0..255` range of the input, so the contrast threshold is
//! scaled by 255 internally.

use crate::features::scale_space::GrayF32;
use crate::features::{Descriptors, FeatureAlgorithm, FeatureExtractor, Features, Keypoint};
use crate::image::pyramid::to_gray;
use crate::image::ImageView;
use crate::refine::{parabola_vertex, subpixel_peak};
use crate::trace::trace_event;
use crate::util::math::{direction_deg, sin_cos_deg, wrap_deg_positive};
use crate::util::ScreenMatchResult;

/// Length of a SIFT descriptor.
pub const SIFT_DESCRIPTOR_DIM: usize = 128;

const IMG_BORDER: usize = 5;
const MIN_OCTAVE_SIZE: usize = 16;
const ORI_BINS: usize = 36;
const ORI_PEAK_RATIO: f32 = 0.8;
const ORI_SIG_FACTOR: f32 = 1.5;
const ORI_RADIUS_FACTOR: f32 = 3.0 * ORI_SIG_FACTOR;
const DESCR_WIDTH: usize = 4;
const DESCR_BINS: usize = 8;
const DESCR_SCALE_FACTOR: f32 = 3.0;
const DESCR_MAG_CLAMP: f32 = 0.2;

/// SIFT extractor parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SiftConfig {
    /// Keypoints kept by response; `0` keeps all.
    pub max_features: usize,
    /// Intervals sampled per octave.
    pub octave_layers: usize,
    /// Blur of the first scale of every octave.
    pub sigma: f32,
    /// Minimum DoG contrast on a `0..1` intensity scale.
    pub contrast_threshold: f32,
    /// Maximum ratio of principal curvatures.
    pub edge_threshold: f32,
    /// Upper bound on the number of octaves.
    pub max_octaves: usize,
    /// Blur already present in the input image.
    pub input_blur: f32,
}

impl Default for SiftConfig {
    fn default() -> Self {
        Self {
            max_features: 0,
            octave_layers: 3,
            sigma: 1.6,
            contrast_threshold: 0.04,
            edge_threshold: 10.0,
            max_octaves: 6,
            input_blur: 0.5,
        }
    }
}

/// SIFT detector and descriptor.
#[derive(Clone, Debug, Default)]
pub struct SiftExtractor {
    config: SiftConfig,
}

struct Octave {
    gaussians: Vec<GrayF32>,
    dogs: Vec<GrayF32>,
}

struct ScaleExtremum {
    octave: usize,
    layer: usize,
    x: usize,
    y: usize,
    fx: f32,
    fy: f32,
    response: f32,
}

impl SiftExtractor {
    pub fn new(config: SiftConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SiftConfig {
        &self.config
    }

    fn layers(&self) -> usize {
        self.config.octave_layers.max(1)
    }

    /// Incremental blur taking layer `i − 1` to layer `i` of an octave.
    fn layer_sigmas(&self) -> Vec<f32> {
        let s = self.layers();
        let k = 2f32.powf(1.0 / s as f32);
        let mut sigmas = vec![self.config.sigma; s + 3];
        for (i, sig) in sigmas.iter_mut().enumerate().skip(1) {
            let prev = self.config.sigma * k.powi(i as i32 - 1);
            let total = prev * k;
            *sig = (total * total - prev * prev).sqrt();
        }
        sigmas
    }

    fn build_octaves(&self, base: GrayF32) -> ScreenMatchResult<Vec<Octave>> {
        let s = self.layers();
        let sigmas = self.layer_sigmas();
        let initial = (self.config.sigma.powi(2) - self.config.input_blur.powi(2))
            .max(0.01)
            .sqrt();

        let mut octaves: Vec<Octave> = Vec::new();
        let mut next = base.gaussian_blur(initial);
        while octaves.len() < self.config.max_octaves
            && next.width().min(next.height()) >= MIN_OCTAVE_SIZE
        {
            let mut gaussians = vec![next];
            for &sigma in &sigmas[1..] {
                let blurred = gaussians[gaussians.len() - 1].gaussian_blur(sigma);
                gaussians.push(blurred);
            }
            let dogs = gaussians
                .windows(2)
                .map(|pair| pair[1].difference(&pair[0]))
                .collect::<ScreenMatchResult<Vec<_>>>()?;
            next = gaussians[s].decimate();
            octaves.push(Octave { gaussians, dogs });
        }
        Ok(octaves)
    }

    fn find_extrema(&self, octaves: &[Octave]) -> Vec<ScaleExtremum> {
        let s = self.layers();
        let contrast = self.config.contrast_threshold / s as f32 * 255.0;
        let r = self.config.edge_threshold;
        let edge_limit = (r + 1.0) * (r + 1.0) / r;

        let mut out = Vec::new();
        for (o, octave) in octaves.iter().enumerate() {
            for layer in 1..=s {
                let (below, cur, above) = (
                    &octave.dogs[layer - 1],
                    &octave.dogs[layer],
                    &octave.dogs[layer + 1],
                );
                let (w, h) = (cur.width(), cur.height());
                if w <= 2 * IMG_BORDER || h <= 2 * IMG_BORDER {
                    continue;
                }
                for y in IMG_BORDER..h - IMG_BORDER {
                    for x in IMG_BORDER..w - IMG_BORDER {
                        let v = cur.at(x, y);
                        if v.abs() < contrast || !is_extremum(v, below, cur, above, x, y) {
                            continue;
                        }

                        let mut patch = [[0.0f32; 3]; 3];
                        for (j, row) in patch.iter_mut().enumerate() {
                            for (i, cell) in row.iter_mut().enumerate() {
                                let sample = cur.at(x + i - 1, y + j - 1);
                                *cell = if v > 0.0 { sample } else { -sample };
                            }
                        }

                        let dxx = patch[1][2] + patch[1][0] - 2.0 * patch[1][1];
                        let dyy = patch[2][1] + patch[0][1] - 2.0 * patch[1][1];
                        let dxy = (patch[2][2] - patch[0][2] - patch[2][0] + patch[0][0]) * 0.25;
                        let tr = dxx + dyy;
                        let det = dxx * dyy - dxy * dxy;
                        if det <= 0.0 || tr * tr >= edge_limit * det {
                            continue;
                        }

                        let (fx, fy) = subpixel_peak(x, y, patch);
                        out.push(ScaleExtremum {
                            octave: o,
                            layer,
                            x,
                            y,
                            fx,
                            fy,
                            response: v.abs(),
                        });
                    }
                }
            }
        }
        out
    }

    fn layer_scale(&self, layer: usize) -> f32 {
        let s = self.layers() as f32;
        self.config.sigma * 2f32.powf(layer as f32 / s)
    }

    fn orientations(&self, img: &GrayF32, x: usize, y: usize, scale: f32) -> Vec<f32> {
        let radius = (ORI_RADIUS_FACTOR * scale).round() as isize;
        let sigma_w = ORI_SIG_FACTOR * scale;
        let denom = 2.0 * sigma_w * sigma_w;

        let mut hist = [0.0f32; ORI_BINS];
        for dy in -radius..=radius {
            let py = y as isize + dy;
            if py < 1 || py >= img.height() as isize - 1 {
                continue;
            }
            for dx in -radius..=radius {
                let px = x as isize + dx;
                if px < 1 || px >= img.width() as isize - 1 {
                    continue;
                }
                let (mag, ori) = gradient(img, px as usize, py as usize);
                let weight = (-((dx * dx + dy * dy) as f32) / denom).exp();
                let bin = (ori * ORI_BINS as f32 / 360.0).round() as usize % ORI_BINS;
                hist[bin] += weight * mag;
            }
        }

        let smoothed: Vec<f32> = (0..ORI_BINS)
            .map(|i| {
                let at = |offset: isize| {
                    hist[(i as isize + offset).rem_euclid(ORI_BINS as isize) as usize]
                };
                (at(-2) + at(2)) / 16.0 + (at(-1) + at(1)) * 4.0 / 16.0 + at(0) * 6.0 / 16.0
            })
            .collect();
        let peak = smoothed.iter().copied().fold(0.0f32, f32::max);
        if peak <= 0.0 {
            return Vec::new();
        }

        let mut angles = Vec::new();
        for i in 0..ORI_BINS {
            let left = smoothed[(i + ORI_BINS - 1) % ORI_BINS];
            let right = smoothed[(i + 1) % ORI_BINS];
            let center = smoothed[i];
            if center > left && center > right && center >= ORI_PEAK_RATIO * peak {
                let offset = parabola_vertex(left, center, right).unwrap_or(0.0);
                angles.push(wrap_deg_positive(
                    (i as f32 + offset) * 360.0 / ORI_BINS as f32,
                ));
            }
        }
        angles
    }

    fn describe(&self, img: &GrayF32, x: usize, y: usize, scale: f32, angle: f32) -> Vec<f32> {
        let d = DESCR_WIDTH;
        let n = DESCR_BINS;
        let (sin, cos) = sin_cos_deg(angle);
        let hist_width = DESCR_SCALE_FACTOR * scale;
        let max_radius = ((img.width().pow(2) + img.height().pow(2)) as f32).sqrt();
        let radius = (hist_width * std::f32::consts::SQRT_2 * (d as f32 + 1.0) * 0.5)
            .round()
            .min(max_radius) as isize;
        let exp_denom = 0.5 * (d * d) as f32;

        let mut hist = vec![0.0f32; d * d * n];
        for i in -radius..=radius {
            for j in -radius..=radius {
                let c_rot = (j as f32 * cos + i as f32 * sin) / hist_width;
                let r_rot = (-(j as f32) * sin + i as f32 * cos) / hist_width;
                let rbin = r_rot + d as f32 / 2.0 - 0.5;
                let cbin = c_rot + d as f32 / 2.0 - 0.5;
                if rbin <= -1.0 || rbin >= d as f32 || cbin <= -1.0 || cbin >= d as f32 {
                    continue;
                }
                let px = x as isize + j;
                let py = y as isize + i;
                if px < 1
                    || py < 1
                    || px >= img.width() as isize - 1
                    || py >= img.height() as isize - 1
                {
                    continue;
                }

                let (mag, ori) = gradient(img, px as usize, py as usize);
                let weight = (-(c_rot * c_rot + r_rot * r_rot) / exp_denom).exp() * mag;
                let obin = wrap_deg_positive(ori - angle) * n as f32 / 360.0;
                accumulate(&mut hist, rbin, cbin, obin, weight);
            }
        }

        let norm = hist.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            let cap = DESCR_MAG_CLAMP * norm;
            for v in &mut hist {
                *v = v.min(cap);
            }
            let renorm = hist.iter().map(|v| v * v).sum::<f32>().sqrt().max(f32::EPSILON);
            for v in &mut hist {
                *v /= renorm;
            }
        }
        hist
    }
}

fn is_extremum(
    v: f32,
    below: &GrayF32,
    cur: &GrayF32,
    above: &GrayF32,
    x: usize,
    y: usize,
) -> bool {
    let is_max = v > 0.0;
    for img in [below, cur, above] {
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                let n = img.at(nx, ny);
                if (is_max && n > v) || (!is_max && n < v) {
                    return false;
                }
            }
        }
    }
    true
}

/// Central-difference gradient magnitude and orientation in degrees.
fn gradient(img: &GrayF32, x: usize, y: usize) -> (f32, f32) {
    let dx = img.at(x + 1, y) - img.at(x - 1, y);
    let dy = img.at(x, y + 1) - img.at(x, y - 1);
    let mag = (dx * dx + dy * dy).sqrt();
    (mag, direction_deg(dx, dy))
}

/// Trilinear vote into a `DESCR_WIDTH x DESCR_WIDTH x DESCR_BINS` histogram.
fn accumulate(hist: &mut [f32], rbin: f32, cbin: f32, obin: f32, weight: f32) {
    let d = DESCR_WIDTH as isize;
    let n = DESCR_BINS;
    let r0 = rbin.floor();
    let c0 = cbin.floor();
    let o0 = obin.floor();
    let (dr, dc, dob) = (rbin - r0, cbin - c0, obin - o0);

    for (ri, wr) in [(r0 as isize, 1.0 - dr), (r0 as isize + 1, dr)] {
        if ri < 0 || ri >= d {
            continue;
        }
        for (ci, wc) in [(c0 as isize, 1.0 - dc), (c0 as isize + 1, dc)] {
            if ci < 0 || ci >= d {
                continue;
            }
            for (oi, wo) in [(o0 as usize % n, 1.0 - dob), ((o0 as usize + 1) % n, dob)] {
                let idx = ((ri as usize * DESCR_WIDTH) + ci as usize) * n + oi;
                hist[idx] += weight * wr * wc * wo;
            }
        }
    }
}

impl FeatureExtractor for SiftExtractor {
    fn algorithm(&self) -> FeatureAlgorithm {
        FeatureAlgorithm::Sift
    }

    fn detect_and_describe(&self, image: ImageView<'_, u8>) -> ScreenMatchResult<Features> {
        let gray = to_gray(image)?;
        let base = GrayF32::from_view(gray.view())?;
        let octaves = self.build_octaves(base)?;
        let mut extrema = self.find_extrema(&octaves);

        // Stable sort keeps scan order among equal responses.
        extrema.sort_by(|a, b| b.response.total_cmp(&a.response));
        if self.config.max_features > 0 {
            extrema.truncate(self.config.max_features);
        }

        let mut keypoints = Vec::new();
        let mut data = Vec::new();
        for ext in &extrema {
            let img = &octaves[ext.octave].gaussians[ext.layer];
            let scale = self.layer_scale(ext.layer);
            let factor = (1u32 << ext.octave) as f32;
            for angle in self.orientations(img, ext.x, ext.y, scale) {
                keypoints.push(Keypoint {
                    x: ext.fx * factor,
                    y: ext.fy * factor,
                    size: 2.0 * scale * factor,
                    angle,
                    response: ext.response,
                    octave: ext.octave as i32,
                });
                data.extend(self.describe(img, ext.x, ext.y, scale, angle));
            }
        }

        trace_event!("sift_features", keypoints = keypoints.len());
        Ok(Features {
            keypoints,
            descriptors: Descriptors::Float {
                dim: SIFT_DESCRIPTOR_DIM,
                data,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{SiftConfig, SiftExtractor, SIFT_DESCRIPTOR_DIM};
    use crate::features::{Descriptors, FeatureExtractor};
    use crate::ImageView;

    fn blobs(width: usize, height: usize) -> Vec<u8> {
        let mut img = vec![40u8; width * height];
        let centers = [(30.0f32, 30.0f32, 5.0f32), (80.0, 40.0, 7.0), (50.0, 80.0, 4.0)];
        for y in 0..height {
            for x in 0..width {
                let mut v = 40.0f32;
                for &(cx, cy, r) in &centers {
                    let d2 = (x as f32 - cx).powi(2) + (y as f32 - cy).powi(2);
                    v += 180.0 * (-d2 / (2.0 * r * r)).exp();
                }
                img[y * width + x] = v.min(255.0) as u8;
            }
        }
        img
    }

    #[test]
    fn layer_sigmas_compose_to_octave_doubling() {
        let sift = SiftExtractor::default();
        let sigmas = sift.layer_sigmas();
        assert_eq!(sigmas.len(), 6);
        let total_sq: f32 = sigmas.iter().take(4).map(|s| s * s).sum();
        assert!((total_sq.sqrt() - 3.2).abs() < 1e-3);
    }

    #[test]
    fn blobs_produce_unit_descriptors() {
        let (w, h) = (112usize, 112usize);
        let img = blobs(w, h);
        let view = ImageView::from_slice(&img, w, h).unwrap();
        let features = SiftExtractor::default().detect_and_describe(view).unwrap();

        assert!(!features.keypoints.is_empty());
        let Descriptors::Float { dim, data } = &features.descriptors else {
            panic!("SIFT produces float descriptors");
        };
        assert_eq!(*dim, SIFT_DESCRIPTOR_DIM);
        assert_eq!(data.len(), dim * features.keypoints.len());
        for desc in data.chunks(*dim) {
            let norm: f32 = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-3 || norm == 0.0);
        }
        assert!(features
            .keypoints
            .iter()
            .any(|kp| (kp.x - 30.0).abs() < 3.0 && (kp.y - 30.0).abs() < 3.0));
    }

    #[test]
    fn max_features_caps_detections() {
        let (w, h) = (112usize, 112usize);
        let img = blobs(w, h);
        let view = ImageView::from_slice(&img, w, h).unwrap();
        let sift = SiftExtractor::new(SiftConfig {
            max_features: 1,
            ..SiftConfig::default()
        });
        let features = sift.detect_and_describe(view).unwrap();
        // One extremum survives; it may carry several orientations.
        let first = features.keypoints[0];
        assert!(features
            .keypoints
            .iter()
            .all(|kp| kp.x == first.x && kp.y == first.y));
    }

    #[test]
    fn tiny_images_have_no_octaves() {
        let img = vec![0u8; 10 * 10];
        let view = ImageView::from_slice(&img, 10, 10).unwrap();
        let features = SiftExtractor::default().detect_and_describe(view).unwrap();
        assert!(features.keypoints.is_empty());
    }
}
