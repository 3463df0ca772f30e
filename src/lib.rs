//! Detection of significant camera movement in frame sequences.
//!
//! Three independent per-frame-pair detectors (binary-descriptor feature
//! matching, sparse optical flow, pixel differencing) each produce a
//! [`Verdict`], and a weighted-voting fusion step combines them into one
//! decision per pair. Scanning a sequence yields the ascending indices of
//! frames whose transition from the previous frame shows movement.
//!
//! ```
//! use camera_movement::{detect_significant_movement, DetectionMethod};
//!
//! // three identical black frames: nothing moves
//! let frames = vec![image::RgbImage::new(64, 64); 3];
//! let indices = detect_significant_movement(&frames, 50.0, DetectionMethod::FrameDifference);
//! assert!(indices.is_empty());
//! ```

pub mod algorithms;
pub mod config;
pub mod detector;
pub mod fusion;
pub mod scan;
pub mod verdict;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::{
    DetectorConfig, FeatureMatchingParams, FrameDifferenceParams, FusionWeights,
    OpticalFlowParams,
};
pub use detector::MovementDetector;
pub use fusion::FusedDecision;
pub use scan::{PairDecision, ScanParams};
pub use verdict::{DetectionMethod, Details, Verdict};

/// Scan `frames` for significant camera movement with the default
/// configuration, returning the indices of frames whose transition from
/// the previous frame was flagged.
pub fn detect_significant_movement(
    frames: &[image::RgbImage],
    threshold: f64,
    method: DetectionMethod,
) -> Vec<usize> {
    MovementDetector::default().scan(frames, &ScanParams { threshold, method })
}
