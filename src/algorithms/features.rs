//! FAST keypoint extraction with BRIEF descriptors, and Hamming-space
//! mutual best-match correspondence search.

use std::cmp::Ordering;

use bitarray::BitArray;
use image::GrayImage;
use imageproc::corners::{corners_fast9, Corner};
use nalgebra::Vector2;
use space::Metric;

use crate::algorithms::brief::{compute_descriptor, BinaryDescriptor};

// kernel value of 2 indicated by the usual BRIEF references
const GAUSSIAN_KERNEL_SIGMA: f32 = 2.0;

/// A keypoint location together with its binary descriptor.
#[derive(Clone)]
pub struct Feature {
    pub position: Vector2<f32>,
    pub descriptor: BinaryDescriptor,
}

/// Hamming metric over feature descriptors.
#[derive(Default)]
pub struct Hamming;

impl Metric<Feature> for Hamming {
    type Unit = u32;

    fn distance(&self, a: &Feature, b: &Feature) -> Self::Unit {
        BitArray::new(a.descriptor).distance(&BitArray::new(b.descriptor))
    }
}

/// A correspondence between feature index `query` in frame A and
/// `train` in frame B.
#[derive(Debug, Clone, Copy)]
pub struct FeatureMatch {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

/// Detect up to `max_keypoints` of the strongest FAST-9 corners and compute
/// BRIEF descriptors over a Gaussian-smoothed copy of the image, so the
/// descriptors are not overly sensitive to high frequency noise.
pub fn extract_features(image: &GrayImage, fast_threshold: u8, max_keypoints: usize) -> Vec<Feature> {
    let mut corners = corners_fast9(image, fast_threshold);
    corners.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    corners.truncate(max_keypoints);

    let smoothed = imageproc::filter::gaussian_blur_f32(image, GAUSSIAN_KERNEL_SIGMA);

    corners
        .into_iter()
        .map(|Corner { x, y, .. }| Feature {
            position: Vector2::new(x as f32, y as f32),
            descriptor: compute_descriptor(x, y, &smoothed),
        })
        .collect()
}

/// Brute-force mutual best-match (cross-check) matching: a pair is kept only
/// when each feature is the other's nearest neighbour. Matches are returned
/// sorted ascending by Hamming distance.
pub fn match_features(query: &[Feature], train: &[Feature]) -> Vec<FeatureMatch> {
    let forward = nearest_neighbours(query, train);
    let backward = nearest_neighbours(train, query);

    let mut matches: Vec<FeatureMatch> = forward
        .into_iter()
        .enumerate()
        .filter_map(|(qi, best)| {
            let (ti, distance) = best?;
            match backward[ti] {
                Some((back, _)) if back == qi => Some(FeatureMatch {
                    query: qi,
                    train: ti,
                    distance,
                }),
                _ => None,
            }
        })
        .collect();

    matches.sort_by_key(|m| m.distance);
    matches
}

fn nearest_neighbours(from: &[Feature], to: &[Feature]) -> Vec<Option<(usize, u32)>> {
    let metric = Hamming;
    from.iter()
        .map(|feature| {
            to.iter()
                .enumerate()
                .map(|(i, other)| (i, metric.distance(feature, other)))
                .min_by_key(|&(_, d)| d)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::textured_gray;

    #[test]
    fn extraction_respects_keypoint_cap() {
        let img = textured_gray(7, 200, 150);
        let features = extract_features(&img, 35, 20);
        assert!(features.len() <= 20);
        assert!(!features.is_empty());
    }

    #[test]
    fn identical_frames_match_at_zero_distance() {
        let img = textured_gray(11, 200, 150);
        let features = extract_features(&img, 35, 1000);
        assert!(features.len() >= 10, "textured frame should yield many corners");

        // corners cluster without non-max suppression, so a feature can tie
        // with a neighbour sharing its descriptor; distances still come out 0
        let matches = match_features(&features, &features);
        assert!(!matches.is_empty());
        assert!(matches.len() <= features.len());
        for m in &matches {
            assert_eq!(m.distance, 0);
        }
    }

    #[test]
    fn matches_are_sorted_by_distance() {
        let a = extract_features(&textured_gray(3, 200, 150), 35, 1000);
        let b = extract_features(&textured_gray(4, 200, 150), 35, 1000);
        let matches = match_features(&a, &b);
        for pair in matches.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn cross_check_is_one_to_one() {
        let a = extract_features(&textured_gray(5, 200, 150), 35, 1000);
        let b = extract_features(&textured_gray(6, 200, 150), 35, 1000);
        let matches = match_features(&a, &b);

        let mut seen_query: Vec<usize> = matches.iter().map(|m| m.query).collect();
        let mut seen_train: Vec<usize> = matches.iter().map(|m| m.train).collect();
        seen_query.sort_unstable();
        seen_query.dedup();
        seen_train.sort_unstable();
        seen_train.dedup();
        assert_eq!(seen_query.len(), matches.len());
        assert_eq!(seen_train.len(), matches.len());
    }
}
