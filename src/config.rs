//! Detector configuration, constructed once per scan and read-only afterwards.
//!
//! Every tunable lives here as a named field so callers can override the
//! heuristics (most importantly the fusion weights) without patching code.

/// Parameters for the feature-matching detector.
#[derive(Debug, Clone)]
pub struct FeatureMatchingParams {
    /// Keep at most this many of the strongest FAST keypoints per frame.
    pub max_keypoints: usize,
    /// FAST-9 corner threshold on intensity difference.
    pub fast_threshold: u8,
    /// Minimum keypoints per frame before matching is attempted.
    pub min_keypoints: usize,
    /// Minimum raw and good matches required for a positive verdict.
    pub min_match_count: usize,
    /// Good matches keep a Hamming distance below this fraction of the
    /// 0..=255 distance range.
    pub distance_threshold: f32,
    /// Reprojection error (pixels) under which a correspondence counts as
    /// an inlier during consensus sampling.
    pub ransac_threshold: f64,
    /// Hypothesis cap for the consensus sampler.
    pub ransac_max_iters: usize,
    /// Seed for the consensus sampler's RNG. Fixed by default so repeated
    /// scans over the same frames produce identical verdicts.
    pub ransac_seed: u64,
    /// Translation (pixels) above which the transform counts as movement.
    pub translation_threshold: f64,
    /// Rotation (degrees) above which the transform counts as movement.
    pub rotation_threshold: f64,
    /// Scale change fraction above which the transform counts as movement.
    pub scale_change_threshold: f64,
}

impl Default for FeatureMatchingParams {
    fn default() -> Self {
        Self {
            max_keypoints: 1000,
            fast_threshold: 35,
            min_keypoints: 10,
            min_match_count: 10,
            distance_threshold: 0.7,
            ransac_threshold: 5.0,
            ransac_max_iters: 1000,
            ransac_seed: 0,
            translation_threshold: 20.0,
            rotation_threshold: 5.0,
            scale_change_threshold: 0.1,
        }
    }
}

/// Parameters for the optical-flow detector.
#[derive(Debug, Clone)]
pub struct OpticalFlowParams {
    /// Maximum corners selected in the first frame.
    pub max_corners: usize,
    /// Corner response threshold as a fraction of the strongest response.
    pub quality_level: f64,
    /// Minimum separation (pixels) between selected corners.
    pub min_distance: f64,
    /// Window side length for the corner response sums.
    pub block_size: u32,
    /// Minimum corners found / tracked before a verdict is attempted.
    pub min_tracked_points: usize,
    /// Half-size of the Lucas-Kanade window (7 gives a 15x15 patch).
    pub window_half: u32,
    /// Pyramid levels above the base image.
    pub pyramid_levels: usize,
    /// Iteration cap per pyramid level.
    pub max_iterations: usize,
    /// Convergence threshold (pixels) for the iterative refinement.
    pub epsilon: f32,
    /// Mean resultant length above which motion counts as consistent.
    pub consistency_threshold: f64,
    /// Average displacement (pixels) above which motion counts as movement.
    pub magnitude_threshold: f64,
}

impl Default for OpticalFlowParams {
    fn default() -> Self {
        Self {
            max_corners: 100,
            quality_level: 0.3,
            min_distance: 7.0,
            block_size: 7,
            min_tracked_points: 10,
            window_half: 7,
            pyramid_levels: 2,
            max_iterations: 10,
            epsilon: 0.03,
            consistency_threshold: 0.6,
            magnitude_threshold: 3.0,
        }
    }
}

/// Parameters for the frame-difference detector.
#[derive(Debug, Clone)]
pub struct FrameDifferenceParams {
    /// Frames wider than this are downscaled proportionally before
    /// comparison to bound compute cost.
    pub max_width: u32,
    /// Per-pixel intensity delta above which a pixel counts as changed.
    pub significant_diff: u8,
}

impl Default for FrameDifferenceParams {
    fn default() -> Self {
        Self {
            max_width: 640,
            significant_diff: 30,
        }
    }
}

/// Weighted-voting policy for `auto` mode.
///
/// These multipliers are a heuristic policy, not derived constants; they are
/// the most consequential tunables in the system.
#[derive(Debug, Clone)]
pub struct FusionWeights {
    pub feature_matching: f64,
    pub optical_flow: f64,
    pub frame_difference: f64,
    /// The fused weighted average must exceed this to declare movement.
    pub decision_threshold: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            feature_matching: 1.5,
            optical_flow: 1.2,
            frame_difference: 1.0,
            decision_threshold: 0.3,
        }
    }
}

/// Full configuration held by a [`MovementDetector`](crate::MovementDetector)
/// for the lifetime of a scan.
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    pub feature_matching: FeatureMatchingParams,
    pub optical_flow: OpticalFlowParams,
    pub frame_difference: FrameDifferenceParams,
    pub fusion: FusionWeights,
}
