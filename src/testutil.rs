//! Synthetic frame generation shared by the unit tests.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A frame covered in randomly placed gray rectangles; the block edges give
/// FAST and Shi-Tomasi plenty of corners to latch onto.
pub(crate) fn textured_rgb(seed: u64, width: u32, height: u32) -> RgbImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = RgbImage::from_pixel(width, height, Rgb([15, 15, 15]));
    for _ in 0..40 {
        let w = rng.gen_range(8..32);
        let h = rng.gen_range(8..32);
        let x = rng.gen_range(0..width - w) as i32;
        let y = rng.gen_range(0..height - h) as i32;
        let v: u8 = rng.gen_range(60..=255);
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), Rgb([v, v, v]));
    }
    img
}

pub(crate) fn textured_gray(seed: u64, width: u32, height: u32) -> GrayImage {
    image::imageops::grayscale(&textured_rgb(seed, width, height))
}

/// Pure horizontal translation with black fill on the exposed left edge.
pub(crate) fn shift_right(frame: &RgbImage, dx: u32) -> RgbImage {
    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        if x >= dx {
            *frame.get_pixel(x - dx, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

pub(crate) fn uniform_rgb(width: u32, height: u32, value: u8) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb([value, value, value]))
}
