//! BRIEF (Binary Robust Independent Elementary Features) descriptors.

use image::{GenericImageView, GrayImage};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Descriptor length in bytes; 256 bits keeps Hamming distances on the
/// same 0..=255 scale the good-match filter is tuned for.
pub const DESCRIPTOR_BYTES: usize = 256 / u8::BITS as usize;

pub type BinaryDescriptor = [u8; DESCRIPTOR_BYTES];

/// Compute a BRIEF descriptor for the keypoint at `(x, y)` on a
/// pre-smoothed grayscale image.
pub fn compute_descriptor(x: u32, y: u32, image: &GrayImage) -> BinaryDescriptor {
    const BITS: usize = u8::BITS as usize;

    let mut descriptor = [0u8; DESCRIPTOR_BYTES];
    for (i, byte) in descriptor.iter_mut().enumerate() {
        for j in 0..BITS {
            let [p1x, p1y, p2x, p2y] = BRIEF256_SAMPLES[i * BITS + j];

            let first = sample(image, x as i32 + p1x as i32, y as i32 + p1y as i32);
            let second = sample(image, x as i32 + p2x as i32, y as i32 + p2y as i32);

            if first > second {
                *byte |= 1 << j;
            }
        }
    }

    descriptor
}

/// Pixel lookup with a zero fallback outside the image bounds.
fn sample(image: &GrayImage, x: i32, y: i32) -> u8 {
    if x >= 0 && y >= 0 && x < image.width() as i32 && y < image.height() as i32 {
        // UNSAFETY JUSTIFICATION
        //  The bounds are checked manually above; out-of-range coordinates
        //  fall back to 0 in the else branch.
        unsafe { image.unsafe_get_pixel(x as u32, y as u32).0[0] }
    } else {
        0
    }
}

/// Precomputed point-pair samples for the 256 descriptor bits.
/// Drawn once from a seeded normal distribution so descriptors stay
/// comparable across frames and across runs.
static BRIEF256_SAMPLES: Lazy<[[i16; 4]; 256]> = Lazy::new(|| {
    let mut rng = StdRng::seed_from_u64(42);

    // sigma 2 keeps the sampled patch around 20x20 pixels
    let normal_dist: Normal<f64> = Normal::new(0.0, 2.0).unwrap();

    let mut samples = [[0; 4]; 256];
    for sample in &mut samples {
        *sample = [
            normal_dist.sample(&mut rng) as i16,
            normal_dist.sample(&mut rng) as i16,
            normal_dist.sample(&mut rng) as i16,
            normal_dist.sample(&mut rng) as i16,
        ];
    }

    samples
});
