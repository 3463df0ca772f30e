//! Weighted-voting fusion of per-detector verdicts.

use crate::config::FusionWeights;
use crate::verdict::{DetectionMethod, Verdict};

/// The fused outcome for one frame pair.
#[derive(Debug, Clone, Copy)]
pub struct FusedDecision {
    pub movement_detected: bool,
    /// Weighted average confidence over the positive verdicts.
    pub score: f64,
}

/// Combine detector verdicts into one decision.
///
/// A single verdict (any explicit non-auto mode) passes through directly.
/// Otherwise each positive verdict contributes its confidence scaled by the
/// per-method multiplier, and movement is declared when the weighted average
/// over the positive votes exceeds the decision threshold. The `max(votes, 1)`
/// denominator floor keeps the average defined when nothing voted.
pub fn fuse(verdicts: &[Verdict], weights: &FusionWeights) -> FusedDecision {
    if let [only] = verdicts {
        return FusedDecision {
            movement_detected: only.movement_detected,
            score: only.confidence,
        };
    }

    let mut weighted_score = 0.0;
    let mut votes = 0usize;
    for verdict in verdicts.iter().filter(|v| v.movement_detected) {
        weighted_score += verdict.confidence * method_weight(weights, verdict.method);
        votes += 1;
    }

    let score = weighted_score / votes.max(1) as f64;
    FusedDecision {
        movement_detected: score > weights.decision_threshold,
        score,
    }
}

fn method_weight(weights: &FusionWeights, method: DetectionMethod) -> f64 {
    match method {
        DetectionMethod::FeatureMatching => weights.feature_matching,
        DetectionMethod::OpticalFlow => weights.optical_flow,
        DetectionMethod::FrameDifference => weights.frame_difference,
        // verdicts never carry the auto selector
        DetectionMethod::Auto => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn verdict(method: DetectionMethod, movement: bool, confidence: f64) -> Verdict {
        Verdict {
            movement_detected: movement,
            confidence,
            method,
            details: None,
        }
    }

    #[test]
    fn zero_positive_votes_yield_no_movement_without_dividing_by_zero() {
        let verdicts = vec![
            verdict(DetectionMethod::FeatureMatching, false, 0.0),
            verdict(DetectionMethod::OpticalFlow, false, 0.9),
            verdict(DetectionMethod::FrameDifference, false, 0.4),
        ];
        let fused = fuse(&verdicts, &FusionWeights::default());
        assert!(!fused.movement_detected);
        assert_approx_eq!(fused.score, 0.0);
    }

    #[test]
    fn single_verdict_passes_through() {
        let weights = FusionWeights::default();

        let positive = fuse(&[verdict(DetectionMethod::FrameDifference, true, 0.2)], &weights);
        assert!(positive.movement_detected);
        assert_approx_eq!(positive.score, 0.2);

        let negative = fuse(&[verdict(DetectionMethod::FrameDifference, false, 0.9)], &weights);
        assert!(!negative.movement_detected);
    }

    #[test]
    fn method_multipliers_weight_the_average() {
        let verdicts = vec![
            verdict(DetectionMethod::FeatureMatching, true, 0.6),
            verdict(DetectionMethod::OpticalFlow, true, 0.5),
            verdict(DetectionMethod::FrameDifference, false, 0.9),
        ];
        let fused = fuse(&verdicts, &FusionWeights::default());
        // (0.6 * 1.5 + 0.5 * 1.2) / 2
        assert_approx_eq!(fused.score, 0.75);
        assert!(fused.movement_detected);
    }

    #[test]
    fn weak_votes_stay_below_the_decision_threshold() {
        let verdicts = vec![
            verdict(DetectionMethod::FeatureMatching, false, 0.0),
            verdict(DetectionMethod::OpticalFlow, false, 0.0),
            verdict(DetectionMethod::FrameDifference, true, 0.25),
        ];
        let fused = fuse(&verdicts, &FusionWeights::default());
        assert_approx_eq!(fused.score, 0.25);
        assert!(!fused.movement_detected);
    }

    #[test]
    fn weights_are_overridable() {
        let weights = FusionWeights {
            frame_difference: 2.0,
            ..FusionWeights::default()
        };
        let verdicts = vec![
            verdict(DetectionMethod::FeatureMatching, false, 0.0),
            verdict(DetectionMethod::OpticalFlow, false, 0.0),
            verdict(DetectionMethod::FrameDifference, true, 0.25),
        ];
        let fused = fuse(&verdicts, &weights);
        assert_approx_eq!(fused.score, 0.5);
        assert!(fused.movement_detected);
    }
}
