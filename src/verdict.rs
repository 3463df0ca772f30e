//! Per-detector verdict records and the method selector.

use std::fmt;
use std::str::FromStr;

use nalgebra::Matrix3;

/// Detection method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionMethod {
    /// Run all three detectors and fuse their verdicts by weighted voting.
    Auto,
    FeatureMatching,
    OpticalFlow,
    FrameDifference,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Auto => "auto",
            DetectionMethod::FeatureMatching => "feature_matching",
            DetectionMethod::OpticalFlow => "optical_flow",
            DetectionMethod::FrameDifference => "frame_difference",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(DetectionMethod::Auto),
            "feature_matching" => Ok(DetectionMethod::FeatureMatching),
            "optical_flow" => Ok(DetectionMethod::OpticalFlow),
            "frame_difference" => Ok(DetectionMethod::FrameDifference),
            other => Err(anyhow::anyhow!("unknown detection method: {other:?}")),
        }
    }
}

/// Method-specific diagnostics attached to a positive analysis.
#[derive(Debug, Clone)]
pub enum Details {
    FeatureMatching {
        matches_found: usize,
        inliers: usize,
        inlier_ratio: f64,
        /// Translation magnitude in pixels.
        translation: f64,
        /// Absolute rotation estimate in degrees.
        rotation: f64,
        scale_change: f64,
        homography: Matrix3<f64>,
    },
    OpticalFlow {
        tracked_points: usize,
        average_magnitude: f64,
        /// Circular-mean direction in degrees.
        dominant_direction: f64,
        /// Mean resultant length of the motion vector directions.
        motion_consistency: f64,
    },
    FrameDifference {
        difference_score: f64,
        significant_pixels_percent: f64,
        combined_score: f64,
    },
}

/// One detector's decision for a single frame pair.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub movement_detected: bool,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    pub method: DetectionMethod,
    /// Diagnostics; absent when the detector bailed out on insufficient
    /// signal (too few keypoints, matches or tracked corners).
    pub details: Option<Details>,
}

impl Verdict {
    /// The zero-confidence negative verdict used for insufficient signal
    /// and degenerate geometry.
    pub(crate) fn negative(method: DetectionMethod) -> Self {
        Self {
            movement_detected: false,
            confidence: 0.0,
            method,
            details: None,
        }
    }
}
