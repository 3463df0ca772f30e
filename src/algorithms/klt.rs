//! Sparse pyramidal Lucas-Kanade point tracking.
//!
//! Forward-additive formulation: per iteration the 2x2 gradient Hessian is
//! rebuilt at the warped position in the second frame and a Gauss-Newton
//! step refines the displacement, coarse-to-fine across the pyramid.

use image::{GrayImage, ImageBuffer, Luma};
use nalgebra::Vector2;

type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Tracking parameters; the defaults give a 15x15 window, two pyramid
/// levels above the base, and the 10-iteration / 0.03 px stop criterion.
#[derive(Debug, Clone)]
pub struct TrackParams {
    pub window_half: u32,
    pub pyramid_levels: usize,
    pub max_iterations: usize,
    pub epsilon: f32,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            window_half: 7,
            pyramid_levels: 2,
            max_iterations: 10,
            epsilon: 0.03,
        }
    }
}

/// Grayscale image pyramid with 2x2 mean downsampling between levels.
pub struct Pyramid {
    levels: Vec<FloatImage>,
}

impl Pyramid {
    pub fn build(image: &GrayImage, levels_above_base: usize) -> Self {
        let mut levels = Vec::with_capacity(levels_above_base + 1);
        levels.push(FloatImage::from_fn(image.width(), image.height(), |x, y| {
            Luma([image.get_pixel(x, y)[0] as f32])
        }));

        for _ in 0..levels_above_base {
            let prev = levels.last().expect("base level present");
            let (w, h) = (prev.width() / 2, prev.height() / 2);
            if w < 8 || h < 8 {
                break;
            }
            let down = FloatImage::from_fn(w, h, |x, y| {
                let (x2, y2) = (2 * x, 2 * y);
                let sum = prev.get_pixel(x2, y2)[0]
                    + prev.get_pixel(x2 + 1, y2)[0]
                    + prev.get_pixel(x2, y2 + 1)[0]
                    + prev.get_pixel(x2 + 1, y2 + 1)[0];
                Luma([sum * 0.25])
            });
            levels.push(down);
        }

        Self { levels }
    }
}

/// Track one point from the first pyramid's frame into the second.
///
/// Returns the new position, or `None` when the track is lost (singular
/// gradient Hessian) or lands outside the image.
pub fn track_point(
    prev: &Pyramid,
    next: &Pyramid,
    point: Vector2<f32>,
    params: &TrackParams,
) -> Option<Vector2<f32>> {
    let levels = prev.levels.len().min(next.levels.len());
    let mut dx = 0.0f32;
    let mut dy = 0.0f32;

    for level in (0..levels).rev() {
        let scale = (1u32 << level) as f32;
        (dx, dy) = refine_at_level(
            &prev.levels[level],
            &next.levels[level],
            point.x / scale,
            point.y / scale,
            dx,
            dy,
            params,
        )?;

        // propagate the displacement to the next finer level
        if level > 0 {
            dx *= 2.0;
            dy *= 2.0;
        }
    }

    let new = Vector2::new(point.x + dx, point.y + dy);
    let in_bounds = new.x >= 0.0
        && new.y >= 0.0
        && new.x < prev.levels[0].width() as f32
        && new.y < prev.levels[0].height() as f32;
    in_bounds.then_some(new)
}

/// Track a batch of points between two frames, building one pyramid pair.
pub fn track_points(
    prev: &GrayImage,
    next: &GrayImage,
    points: &[Vector2<f32>],
    params: &TrackParams,
) -> Vec<Option<Vector2<f32>>> {
    let prev_pyramid = Pyramid::build(prev, params.pyramid_levels);
    let next_pyramid = Pyramid::build(next, params.pyramid_levels);
    points
        .iter()
        .map(|&p| track_point(&prev_pyramid, &next_pyramid, p, params))
        .collect()
}

fn refine_at_level(
    prev: &FloatImage,
    next: &FloatImage,
    px: f32,
    py: f32,
    mut dx: f32,
    mut dy: f32,
    params: &TrackParams,
) -> Option<(f32, f32)> {
    let half = params.window_half as i32;

    for _ in 0..params.max_iterations {
        let mut h00 = 0.0f32;
        let mut h01 = 0.0f32;
        let mut h11 = 0.0f32;
        let mut b0 = 0.0f32;
        let mut b1 = 0.0f32;

        for wy in -half..=half {
            for wx in -half..=half {
                let tx = px + wx as f32;
                let ty = py + wy as f32;
                let warped_x = tx + dx;
                let warped_y = ty + dy;

                let error = sample_bilinear(prev, tx, ty) - sample_bilinear(next, warped_x, warped_y);

                // central differences at the warped position
                let gx = 0.5
                    * (sample_bilinear(next, warped_x + 1.0, warped_y)
                        - sample_bilinear(next, warped_x - 1.0, warped_y));
                let gy = 0.5
                    * (sample_bilinear(next, warped_x, warped_y + 1.0)
                        - sample_bilinear(next, warped_x, warped_y - 1.0));

                h00 += gx * gx;
                h01 += gx * gy;
                h11 += gy * gy;
                b0 += gx * error;
                b1 += gy * error;
            }
        }

        let det = h00 * h11 - h01 * h01;
        if det.abs() < 1e-6 {
            return None;
        }
        let inv_det = 1.0 / det;
        let step_x = inv_det * (h11 * b0 - h01 * b1);
        let step_y = inv_det * (h00 * b1 - h01 * b0);

        dx += step_x;
        dy += step_y;

        if step_x * step_x + step_y * step_y < params.epsilon * params.epsilon {
            break;
        }
    }

    Some((dx, dy))
}

fn sample_bilinear(image: &FloatImage, x: f32, y: f32) -> f32 {
    let w = image.width() as i32;
    let h = image.height() as i32;
    let x0 = (x.floor() as i32).clamp(0, w - 1);
    let y0 = (y.floor() as i32).clamp(0, h - 1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = (x - x0 as f32).clamp(0.0, 1.0);
    let fy = (y - y0 as f32).clamp(0.0, 1.0);

    let p = |px: i32, py: i32| image.get_pixel(px as u32, py as u32)[0];
    let top = p(x0, y0) * (1.0 - fx) + p(x1, y0) * fx;
    let bottom = p(x0, y1) * (1.0 - fx) + p(x1, y1) * fx;
    top * (1.0 - fy) + bottom * fy
}
