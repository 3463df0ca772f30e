//! Robust projective transform estimation and its decomposition into
//! translation / rotation / scale-change magnitudes.

use arrsac::Arrsac;
use nalgebra::{Matrix3, SMatrix, Vector2, Vector3};
use rand::{rngs::StdRng, SeedableRng};
use sample_consensus::{Consensus, Estimator, Model};

/// A matched point pair: frame-A location, frame-B location.
pub type Correspondence = (Vector2<f64>, Vector2<f64>);

/// A 3x3 projective transform mapping frame-A points to frame-B points.
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    /// Map a frame-A point through the transform, normalising the
    /// projective scale.
    pub fn project(&self, point: &Vector2<f64>) -> Option<Vector2<f64>> {
        let q = self.0 * Vector3::new(point.x, point.y, 1.0);
        if q.z.abs() < f64::EPSILON {
            None
        } else {
            Some(Vector2::new(q.x / q.z, q.y / q.z))
        }
    }
}

impl<'a> Model<&'a Correspondence> for Homography {
    /// Reprojection error in pixels; points mapped to the plane at
    /// infinity count as unbounded residuals.
    fn residual(&self, data: &&'a Correspondence) -> f64 {
        let (src, dst) = data;
        match self.project(src) {
            Some(projected) => (projected - dst).norm(),
            None => f64::MAX,
        }
    }
}

/// Direct Linear Transform estimator over 4-point minimal samples.
#[derive(Default)]
pub struct HomographyEstimator;

impl<'a> Estimator<&'a Correspondence> for HomographyEstimator {
    const MIN_SAMPLES: usize = 4;
    type Model = Homography;
    type ModelIter = std::iter::Once<Homography>;

    fn estimate<I>(&self, data: I) -> Self::ModelIter
    where
        I: Iterator<Item = &'a Correspondence> + Clone,
    {
        // Two constraint rows per correspondence:
        // [-x -y -1  0  0  0  ux uy u]
        // [ 0  0  0 -x -y -1  vx vy v]
        let mut constraints = SMatrix::<f64, 8, 9>::zeros();
        for (i, (src, dst)) in data.take(Self::MIN_SAMPLES).enumerate() {
            let (x, y) = (src.x, src.y);
            let (u, v) = (dst.x, dst.y);
            let r = 2 * i;
            constraints[(r, 0)] = -x;
            constraints[(r, 1)] = -y;
            constraints[(r, 2)] = -1.0;
            constraints[(r, 6)] = u * x;
            constraints[(r, 7)] = u * y;
            constraints[(r, 8)] = u;
            constraints[(r + 1, 3)] = -x;
            constraints[(r + 1, 4)] = -y;
            constraints[(r + 1, 5)] = -1.0;
            constraints[(r + 1, 6)] = v * x;
            constraints[(r + 1, 7)] = v * y;
            constraints[(r + 1, 8)] = v;
        }

        // The transform is the nullspace of the constraint matrix, i.e. the
        // eigenvector of AᵀA with the smallest eigenvalue.
        let normal = constraints.transpose() * constraints;
        let eigen = normal.symmetric_eigen();
        let mut min_index = 0;
        for k in 1..9 {
            if eigen.eigenvalues[k] < eigen.eigenvalues[min_index] {
                min_index = k;
            }
        }
        let h = eigen.eigenvectors.column(min_index);

        std::iter::once(Homography(Matrix3::new(
            h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8],
        )))
    }
}

/// Estimate a homography from matched coordinates with ARRSAC, an adaptive
/// real-time random sample consensus scheme. The RNG is seeded so repeated
/// runs over the same matches return the same model and inlier set.
///
/// Returns the model and the inlier indices, or `None` when the match
/// configuration is degenerate.
pub fn estimate_homography(
    matches: &[Correspondence],
    inlier_threshold: f64,
    max_iterations: usize,
    seed: u64,
) -> Option<(Homography, Vec<usize>)> {
    if matches.len() < HomographyEstimator::MIN_SAMPLES {
        return None;
    }

    Arrsac::new(inlier_threshold, StdRng::seed_from_u64(seed))
        .max_candidate_hypotheses(max_iterations)
        .model_inliers(&HomographyEstimator, matches.iter())
}

/// Decomposed transform magnitudes.
///
/// The rotation estimate comes from the 2x2 linear block and is only valid
/// for near-similarity transforms; strong perspective distortion can
/// misestimate it. Inherited behaviour, kept as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformAnalysis {
    /// Euclidean norm of the translation column, in pixels.
    pub translation: f64,
    /// Absolute rotation estimate, in degrees.
    pub rotation: f64,
    /// Deviation of the mean column-norm scale from 1.
    pub scale_change: f64,
    /// Heuristic overall strength in `[0, 1]`: 100 px translation, 45
    /// degrees rotation and 100% scale change each count as full-strength
    /// evidence on their own.
    pub magnitude: f64,
}

impl TransformAnalysis {
    /// Decompose a homography. Degenerate or non-finite input yields the
    /// zeroed analysis instead of an error.
    pub fn from_homography(homography: &Matrix3<f64>) -> Self {
        let w = homography[(2, 2)];
        if !w.is_finite() || w.abs() < 1e-12 {
            return Self::default();
        }
        let h = *homography / w;

        let translation = (h[(0, 2)].powi(2) + h[(1, 2)].powi(2)).sqrt();
        let rotation = h[(1, 0)].atan2(h[(0, 0)]).to_degrees().abs();
        let scale_x = (h[(0, 0)].powi(2) + h[(1, 0)].powi(2)).sqrt();
        let scale_y = (h[(0, 1)].powi(2) + h[(1, 1)].powi(2)).sqrt();
        let scale_change = (1.0 - (scale_x + scale_y) / 2.0).abs();

        if !translation.is_finite() || !rotation.is_finite() || !scale_change.is_finite() {
            return Self::default();
        }

        let magnitude = (translation / 100.0 + rotation / 45.0 + scale_change).min(1.0);

        Self {
            translation,
            rotation,
            scale_change,
            magnitude,
        }
    }
}
