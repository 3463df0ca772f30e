//! The three per-frame-pair movement detectors.

use image::imageops::{self, FilterType};
use image::RgbImage;
use nalgebra::Vector2;

use crate::algorithms::corners::good_features_to_track;
use crate::algorithms::features::{extract_features, match_features};
use crate::algorithms::homography::{estimate_homography, Correspondence, TransformAnalysis};
use crate::algorithms::klt::{track_points, TrackParams};
use crate::algorithms::motion::analyze_motion_vectors;
use crate::config::DetectorConfig;
use crate::verdict::{DetectionMethod, Details, Verdict};

/// Detector holder: owns the configuration for the lifetime of a scan.
/// Every detect call is otherwise stateless, so one instance can serve any
/// number of frame pairs.
#[derive(Debug, Clone, Default)]
pub struct MovementDetector {
    pub(crate) config: DetectorConfig,
}

impl MovementDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect camera movement by matching binary keypoint descriptors
    /// between the frames and decomposing a robustly estimated projective
    /// transform.
    pub fn detect_with_feature_matching(&self, frame1: &RgbImage, frame2: &RgbImage) -> Verdict {
        let p = &self.config.feature_matching;
        let gray1 = imageops::grayscale(frame1);
        let gray2 = imageops::grayscale(frame2);

        let features1 = extract_features(&gray1, p.fast_threshold, p.max_keypoints);
        let features2 = extract_features(&gray2, p.fast_threshold, p.max_keypoints);
        if features1.len() < p.min_keypoints || features2.len() < p.min_keypoints {
            return Verdict::negative(DetectionMethod::FeatureMatching);
        }

        let matches = match_features(&features1, &features2);
        if matches.len() < p.min_match_count {
            return Verdict::negative(DetectionMethod::FeatureMatching);
        }

        // distances are scored against a 0..=255 range
        let max_distance = p.distance_threshold * u8::MAX as f32;
        let good: Vec<Correspondence> = matches
            .iter()
            .filter(|m| (m.distance as f32) < max_distance)
            .map(|m| {
                let a = features1[m.query].position;
                let b = features2[m.train].position;
                (
                    Vector2::new(a.x as f64, a.y as f64),
                    Vector2::new(b.x as f64, b.y as f64),
                )
            })
            .collect();
        if good.len() < p.min_match_count {
            return Verdict::negative(DetectionMethod::FeatureMatching);
        }

        let Some((model, inlier_indices)) =
            estimate_homography(&good, p.ransac_threshold, p.ransac_max_iters, p.ransac_seed)
        else {
            return Verdict::negative(DetectionMethod::FeatureMatching);
        };

        let analysis = TransformAnalysis::from_homography(&model.0);
        let inlier_ratio = inlier_indices.len() as f64 / good.len() as f64;

        let movement_detected = analysis.translation > p.translation_threshold
            || analysis.rotation > p.rotation_threshold
            || analysis.scale_change > p.scale_change_threshold;
        let confidence = (inlier_ratio * analysis.magnitude).min(1.0);

        Verdict {
            movement_detected,
            confidence,
            method: DetectionMethod::FeatureMatching,
            details: Some(Details::FeatureMatching {
                matches_found: good.len(),
                inliers: inlier_indices.len(),
                inlier_ratio,
                translation: analysis.translation,
                rotation: analysis.rotation,
                scale_change: analysis.scale_change,
                homography: model.0,
            }),
        }
    }

    /// Detect camera movement from the directional consistency of sparse
    /// optical flow over tracked corner points.
    pub fn detect_with_optical_flow(&self, frame1: &RgbImage, frame2: &RgbImage) -> Verdict {
        let p = &self.config.optical_flow;
        let gray1 = imageops::grayscale(frame1);
        let gray2 = imageops::grayscale(frame2);

        let corners = good_features_to_track(
            &gray1,
            p.max_corners,
            p.quality_level,
            p.min_distance,
            p.block_size,
        );
        if corners.len() < p.min_tracked_points {
            return Verdict::negative(DetectionMethod::OpticalFlow);
        }

        let track_params = TrackParams {
            window_half: p.window_half,
            pyramid_levels: p.pyramid_levels,
            max_iterations: p.max_iterations,
            epsilon: p.epsilon,
        };
        let tracked = track_points(&gray1, &gray2, &corners, &track_params);

        let vectors: Vec<Vector2<f64>> = corners
            .iter()
            .zip(&tracked)
            .filter_map(|(old, new)| {
                new.map(|new| Vector2::new((new.x - old.x) as f64, (new.y - old.y) as f64))
            })
            .collect();
        if vectors.len() < p.min_tracked_points {
            return Verdict::negative(DetectionMethod::OpticalFlow);
        }

        let motion = analyze_motion_vectors(&vectors);
        let movement_detected = motion.consistency > p.consistency_threshold
            && motion.average_magnitude > p.magnitude_threshold;

        Verdict {
            movement_detected,
            confidence: motion.consistency.min(1.0),
            method: DetectionMethod::OpticalFlow,
            details: Some(Details::OpticalFlow {
                tracked_points: vectors.len(),
                average_magnitude: motion.average_magnitude,
                dominant_direction: motion.dominant_direction,
                motion_consistency: motion.consistency,
            }),
        }
    }

    /// Detect movement from plain pixel differencing, downscaling wide
    /// frames first to bound the comparison cost.
    pub fn detect_frame_difference(
        &self,
        frame1: &RgbImage,
        frame2: &RgbImage,
        threshold: f64,
    ) -> Verdict {
        let p = &self.config.frame_difference;
        let mut gray1 = imageops::grayscale(frame1);
        let mut gray2 = imageops::grayscale(frame2);

        let width = gray1.width();
        if width > p.max_width {
            let scale = p.max_width as f64 / width as f64;
            let new_width = p.max_width;
            let new_height = ((gray1.height() as f64 * scale) as u32).max(1);
            gray1 = imageops::resize(&gray1, new_width, new_height, FilterType::Triangle);
            gray2 = imageops::resize(&gray2, new_width, new_height, FilterType::Triangle);
        }

        let total = gray1.as_raw().len();
        if total == 0 {
            return Verdict::negative(DetectionMethod::FrameDifference);
        }

        let mut sum = 0u64;
        let mut significant = 0u64;
        for (a, b) in gray1.as_raw().iter().zip(gray2.as_raw()) {
            let diff = a.abs_diff(*b);
            sum += u64::from(diff);
            if diff > p.significant_diff {
                significant += 1;
            }
        }

        let score = sum as f64 / total as f64;
        let significant_percent = significant as f64 / total as f64 * 100.0;
        let combined_score = score + significant_percent * 2.0;

        Verdict {
            movement_detected: combined_score > threshold,
            confidence: (combined_score / (threshold * 2.0)).min(1.0),
            method: DetectionMethod::FrameDifference,
            details: Some(Details::FrameDifference {
                difference_score: score,
                significant_pixels_percent: significant_percent,
                combined_score,
            }),
        }
    }
}
