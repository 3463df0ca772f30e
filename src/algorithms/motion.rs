//! Circular statistics over sparse motion vector sets.

use nalgebra::Vector2;

/// Aggregate motion statistics for one frame pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalMotion {
    /// Mean displacement magnitude in pixels.
    pub average_magnitude: f64,
    /// Circular-mean direction in degrees.
    pub dominant_direction: f64,
    /// Mean resultant length of the vector directions: exactly 1 when all
    /// vectors point the same way, approaching 0 when directions are
    /// uniformly scattered.
    pub consistency: f64,
}

/// Analyze a motion vector set. Empty input yields the zeroed statistics.
pub fn analyze_motion_vectors(vectors: &[Vector2<f64>]) -> GlobalMotion {
    if vectors.is_empty() {
        return GlobalMotion::default();
    }
    let n = vectors.len() as f64;

    let average_magnitude = vectors.iter().map(|v| v.norm()).sum::<f64>() / n;

    // averaging sine/cosine components avoids angle wraparound artifacts
    let (sum_cos, sum_sin) = vectors.iter().fold((0.0, 0.0), |(c, s), v| {
        let angle = v.y.atan2(v.x);
        (c + angle.cos(), s + angle.sin())
    });
    let mean_cos = sum_cos / n;
    let mean_sin = sum_sin / n;

    GlobalMotion {
        average_magnitude,
        dominant_direction: mean_sin.atan2(mean_cos).to_degrees(),
        consistency: (mean_cos * mean_cos + mean_sin * mean_sin).sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn empty_set_is_zeroed() {
        assert_eq!(analyze_motion_vectors(&[]), GlobalMotion::default());
    }

    #[test]
    fn identical_directions_have_unit_consistency() {
        let vectors = vec![Vector2::new(3.0, 4.0); 20];
        let motion = analyze_motion_vectors(&vectors);
        assert_approx_eq!(motion.consistency, 1.0, 1e-12);
        assert_approx_eq!(motion.average_magnitude, 5.0, 1e-12);
        assert_approx_eq!(motion.dominant_direction, (4.0f64 / 3.0).atan().to_degrees(), 1e-9);
    }

    #[test]
    fn diverging_directions_reduce_consistency() {
        let vectors = vec![
            Vector2::new(5.0, 0.0),
            Vector2::new(0.0, 5.0),
            Vector2::new(5.0, 1.0),
        ];
        let motion = analyze_motion_vectors(&vectors);
        assert!(motion.consistency < 1.0);
        assert!(motion.consistency > 0.0);
    }

    #[test]
    fn opposed_directions_cancel() {
        let vectors = vec![Vector2::new(4.0, 0.0), Vector2::new(-4.0, 0.0)];
        let motion = analyze_motion_vectors(&vectors);
        assert_approx_eq!(motion.consistency, 0.0, 1e-12);
        assert_approx_eq!(motion.average_magnitude, 4.0, 1e-12);
    }

    #[test]
    fn consistency_is_invariant_to_uniform_scaling() {
        let vectors = vec![
            Vector2::new(2.0, 1.0),
            Vector2::new(1.5, 0.5),
            Vector2::new(2.5, 1.5),
        ];
        let scaled: Vec<_> = vectors.iter().map(|v| v * 8.0).collect();
        let original = analyze_motion_vectors(&vectors);
        let rescaled = analyze_motion_vectors(&scaled);
        assert_approx_eq!(original.consistency, rescaled.consistency, 1e-12);
        assert_approx_eq!(original.dominant_direction, rescaled.dominant_direction, 1e-9);
        assert_approx_eq!(rescaled.average_magnitude, original.average_magnitude * 8.0, 1e-9);
    }

    #[test]
    fn wraparound_directions_average_correctly() {
        // +170 and -170 degrees should average to 180, not 0
        let a = 170f64.to_radians();
        let b = (-170f64).to_radians();
        let vectors = vec![
            Vector2::new(a.cos(), a.sin()) * 5.0,
            Vector2::new(b.cos(), b.sin()) * 5.0,
        ];
        let motion = analyze_motion_vectors(&vectors);
        assert_approx_eq!(motion.dominant_direction.abs(), 180.0, 1e-6);
    }
}
