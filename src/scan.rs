//! Sequence scanning: iterate consecutive frame pairs, fuse the detector
//! verdicts and accumulate flagged indices.

use anyhow::{ensure, Result};
use image::RgbImage;
use log::{debug, error, warn};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::detector::MovementDetector;
use crate::fusion::fuse;
use crate::verdict::{DetectionMethod, Verdict};

/// Scan parameters. The threshold only carries semantic weight for the
/// frame-difference detector.
#[derive(Debug, Clone)]
pub struct ScanParams {
    pub threshold: f64,
    pub method: DetectionMethod,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            method: DetectionMethod::Auto,
        }
    }
}

/// Fused outcome for one frame pair, with the per-detector verdicts kept
/// for diagnostic display.
#[derive(Debug, Clone)]
pub struct PairDecision {
    /// Index of the later frame of the pair.
    pub index: usize,
    pub movement_detected: bool,
    pub fused_score: f64,
    pub verdicts: Vec<Verdict>,
}

impl MovementDetector {
    /// Scan all consecutive frame pairs and return the ascending indices
    /// `i` where significant movement was detected between frames `i - 1`
    /// and `i`.
    ///
    /// Sequences shorter than two frames yield an empty result. Pairs with
    /// mismatched shapes are skipped, and a failure while processing a
    /// single pair is logged and treated as no movement; neither aborts
    /// the scan.
    pub fn scan(&self, frames: &[RgbImage], params: &ScanParams) -> Vec<usize> {
        self.scan_detailed(frames, params)
            .into_iter()
            .filter(|decision| decision.movement_detected)
            .map(|decision| decision.index)
            .collect()
    }

    /// Like [`scan`](Self::scan) but returns the full per-pair decisions,
    /// including every detector verdict, for callers that render
    /// diagnostics.
    pub fn scan_detailed(&self, frames: &[RgbImage], params: &ScanParams) -> Vec<PairDecision> {
        if frames.len() < 2 {
            return Vec::new();
        }

        let process = |index: usize| -> Option<PairDecision> {
            let prev = &frames[index - 1];
            let frame = &frames[index];
            if prev.dimensions() != frame.dimensions() {
                warn!(
                    "skipping frame {index}: shape {:?} does not match previous {:?}",
                    frame.dimensions(),
                    prev.dimensions()
                );
                return None;
            }
            match self.process_pair(index, prev, frame, params) {
                Ok(decision) => Some(decision),
                Err(err) => {
                    error!("error processing frame {index}: {err}");
                    None
                }
            }
        };

        #[cfg(feature = "parallel")]
        {
            // rayon keeps collected results in index order, so the output
            // stays ascending regardless of completion order
            (1..frames.len()).into_par_iter().filter_map(process).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            (1..frames.len()).filter_map(process).collect()
        }
    }

    fn process_pair(
        &self,
        index: usize,
        prev: &RgbImage,
        frame: &RgbImage,
        params: &ScanParams,
    ) -> Result<PairDecision> {
        let (width, height) = frame.dimensions();
        ensure!(width > 0 && height > 0, "frame {index} has zero-sized dimensions");

        let mut verdicts = Vec::with_capacity(3);
        if matches!(
            params.method,
            DetectionMethod::Auto | DetectionMethod::FeatureMatching
        ) {
            verdicts.push(self.detect_with_feature_matching(prev, frame));
        }
        if matches!(
            params.method,
            DetectionMethod::Auto | DetectionMethod::OpticalFlow
        ) {
            verdicts.push(self.detect_with_optical_flow(prev, frame));
        }
        if matches!(
            params.method,
            DetectionMethod::Auto | DetectionMethod::FrameDifference
        ) {
            verdicts.push(self.detect_frame_difference(prev, frame, params.threshold));
        }

        let fused = fuse(&verdicts, &self.config.fusion);
        debug!(
            "frame {index}: movement={} score={:.3} ({} verdicts)",
            fused.movement_detected,
            fused.score,
            verdicts.len()
        );

        Ok(PairDecision {
            index,
            movement_detected: fused.movement_detected,
            fused_score: fused.score,
            verdicts,
        })
    }
}
