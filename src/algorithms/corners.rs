//! Shi-Tomasi "good features to track" corner selection.

use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use nalgebra::Vector2;

/// Select up to `max_corners` trackable corners, strongest first.
///
/// The response at each pixel is the smaller eigenvalue of the gradient
/// structure tensor summed over a `block_size` window. Candidates below
/// `quality_level` times the strongest response are discarded, and the
/// survivors are greedily thinned so no two selected corners are closer
/// than `min_distance` pixels.
pub fn good_features_to_track(
    image: &GrayImage,
    max_corners: usize,
    quality_level: f64,
    min_distance: f64,
    block_size: u32,
) -> Vec<Vector2<f32>> {
    let (width, height) = image.dimensions();
    let radius = block_size / 2;
    if max_corners == 0 || width <= 2 * radius + 2 || height <= 2 * radius + 2 {
        return Vec::new();
    }

    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    let mut candidates: Vec<(f64, u32, u32)> = Vec::new();
    let mut max_response = 0.0f64;

    for y in radius + 1..height - radius - 1 {
        for x in radius + 1..width - radius - 1 {
            let mut sxx = 0.0;
            let mut syy = 0.0;
            let mut sxy = 0.0;
            for by in y - radius..=y + radius {
                for bx in x - radius..=x + radius {
                    let dx = gx.get_pixel(bx, by)[0] as f64;
                    let dy = gy.get_pixel(bx, by)[0] as f64;
                    sxx += dx * dx;
                    syy += dy * dy;
                    sxy += dx * dy;
                }
            }

            // smaller eigenvalue of [sxx sxy; sxy syy]
            let response = 0.5 * (sxx + syy - ((sxx - syy).powi(2) + 4.0 * sxy * sxy).sqrt());
            if response > 0.0 {
                candidates.push((response, x, y));
                max_response = max_response.max(response);
            }
        }
    }

    if max_response <= 0.0 {
        return Vec::new();
    }

    let threshold = quality_level * max_response;
    candidates.retain(|&(response, _, _)| response >= threshold);
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let min_distance_sq = min_distance * min_distance;
    let mut selected: Vec<Vector2<f32>> = Vec::new();
    for (_, x, y) in candidates {
        let far_enough = selected.iter().all(|p| {
            let dx = p.x as f64 - x as f64;
            let dy = p.y as f64 - y as f64;
            dx * dx + dy * dy >= min_distance_sq
        });
        if far_enough {
            selected.push(Vector2::new(x as f32, y as f32));
            if selected.len() == max_corners {
                break;
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::textured_gray;

    #[test]
    fn flat_image_has_no_corners() {
        let img = GrayImage::from_pixel(120, 100, image::Luma([128]));
        assert!(good_features_to_track(&img, 100, 0.3, 7.0, 7).is_empty());
    }

    #[test]
    fn textured_image_yields_corners_up_to_cap() {
        let img = textured_gray(21, 200, 150);
        let corners = good_features_to_track(&img, 100, 0.3, 7.0, 7);
        assert!(corners.len() >= 10, "corners: {}", corners.len());
        assert!(corners.len() <= 100);
    }

    #[test]
    fn selected_corners_respect_min_distance() {
        let img = textured_gray(22, 200, 150);
        let corners = good_features_to_track(&img, 100, 0.3, 7.0, 7);
        for (i, a) in corners.iter().enumerate() {
            for b in corners.iter().skip(i + 1) {
                let d = (a - b).norm();
                assert!(d >= 7.0, "corners {a:?} and {b:?} are {d} apart");
            }
        }
    }

    #[test]
    fn single_bright_square_puts_corners_on_its_boundary() {
        let mut img = GrayImage::from_pixel(100, 100, image::Luma([20]));
        for y in 40..60 {
            for x in 40..60 {
                img.put_pixel(x, y, image::Luma([220]));
            }
        }
        let corners = good_features_to_track(&img, 10, 0.3, 7.0, 7);
        assert!(!corners.is_empty());
        for c in &corners {
            assert!(
                (36.0..=64.0).contains(&c.x) && (36.0..=64.0).contains(&c.y),
                "corner {c:?} far from the square"
            );
        }
    }
}
