//! Score normalization and weighting
//!
//! Every raw measurement is mapped onto the same 0-10 scale through a per-benchmark
//! [`ReferenceRange`], and the four stage scores are combined with [`WEIGHTS`].

use serde::{Deserialize, Serialize};

/// Version of the scoring semantics.
///
/// Bump this when score meanings change (reference ranges, weights, workloads).
pub const SCORE_VERSION: &str = "1";

/// Highest score a stage or the composite can reach.
pub const MAX_SCORE: f64 = 10.0;

/// Raw-unit interval mapped linearly onto `0..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
}

impl ReferenceRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Score `value` against this range.
    pub fn score(&self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }
}

/// Reference ranges, calibrated so a low-end machine scores near 0 and a current high-end desktop
/// near 10.
pub mod reference {
    use super::ReferenceRange;

    /// Dense f32 matrix multiply, GFLOPS.
    pub const CPU_GFLOPS: ReferenceRange = ReferenceRange::new(50.0, 700.0);
    /// SHA-256 loop, reciprocal of the loop duration in seconds.
    pub const CPU_HASH_RATE: ReferenceRange = ReferenceRange::new(0.01, 1.0);
    /// Sequential write + read bandwidth, MB/s.
    pub const RAM_MB_S: ReferenceRange = ReferenceRange::new(500.0, 70_000.0);
    /// Weighted sequential/random disk throughput, MB/s.
    pub const DISK_MB_S: ReferenceRange = ReferenceRange::new(20.0, 2_000.0);
    /// Clear-and-present frame rate, FPS.
    pub const GPU_FPS: ReferenceRange = ReferenceRange::new(10.0, 200.0);
}

/// Per-stage weights of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Weights {
    pub cpu: f64,
    pub ram: f64,
    pub disk: f64,
    pub gpu: f64,
}

pub const WEIGHTS: Weights = Weights {
    cpu: 0.30,
    ram: 0.20,
    disk: 0.20,
    gpu: 0.30,
};

/// Map `value` from `[ref_min, ref_max]` onto `[0, 10]`, clamped and rounded to two decimals.
///
/// A degenerate range (`ref_max <= ref_min`) and a NaN value both score `0.0`.
pub fn normalize(value: f64, ref_min: f64, ref_max: f64) -> f64 {
    if value.is_nan() || ref_max <= ref_min {
        return 0.0;
    }
    if value <= ref_min {
        return 0.0;
    }
    if value >= ref_max {
        return MAX_SCORE;
    }

    round2((value - ref_min) / (ref_max - ref_min) * MAX_SCORE)
}

/// Weighted composite of the four stage scores.
pub fn composite(cpu: f64, ram: f64, disk: f64, gpu: f64) -> f64 {
    let weighted = WEIGHTS.cpu * cpu + WEIGHTS.ram * ram + WEIGHTS.disk * disk + WEIGHTS.gpu * gpu;
    round2(weighted).clamp(0.0, MAX_SCORE)
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_at_or_below_min_score_zero() {
        assert_eq!(normalize(50.0, 50.0, 700.0), 0.0);
        assert_eq!(normalize(-3.0, 50.0, 700.0), 0.0);
        assert_eq!(normalize(f64::NEG_INFINITY, 50.0, 700.0), 0.0);
    }

    #[test]
    fn values_at_or_above_max_score_ten() {
        assert_eq!(normalize(700.0, 50.0, 700.0), 10.0);
        assert_eq!(normalize(1e12, 50.0, 700.0), 10.0);
        assert_eq!(normalize(f64::INFINITY, 50.0, 700.0), 10.0);
    }

    #[test]
    fn midpoint_scores_five() {
        assert_eq!(normalize(375.0, 50.0, 700.0), 5.0);
        assert_eq!(normalize(105.0, 10.0, 200.0), 5.0);
    }

    #[test]
    fn interior_values_round_to_two_decimals() {
        assert_eq!(normalize(125.0, 50.0, 700.0), 1.15);
        assert_eq!(reference::CPU_GFLOPS.score(125.0), 1.15);
    }

    #[test]
    fn normalize_is_monotonic_inside_range() {
        let mut previous = 0.0;
        let mut value = 20.0;
        while value <= 2000.0 {
            let score = reference::DISK_MB_S.score(value);
            assert!(score >= previous, "{value} scored {score} < {previous}");
            assert!((0.0..=10.0).contains(&score));
            previous = score;
            value += 7.5;
        }
    }

    #[test]
    fn degenerate_range_scores_zero() {
        for value in [-1.0, 0.0, 99.0, 100.0, 101.0, 1e9] {
            assert_eq!(normalize(value, 100.0, 100.0), 0.0);
            assert_eq!(normalize(value, 200.0, 100.0), 0.0);
        }
    }

    #[test]
    fn nan_scores_zero() {
        assert_eq!(normalize(f64::NAN, 0.0, 1.0), 0.0);
    }

    #[test]
    fn weights_sum_to_one() {
        let sum = WEIGHTS.cpu + WEIGHTS.ram + WEIGHTS.disk + WEIGHTS.gpu;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn composite_matches_weighted_sum() {
        assert_eq!(composite(8.0, 6.0, 4.0, 9.0), 7.1);
        assert_eq!(composite(0.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(composite(10.0, 10.0, 10.0, 10.0), 10.0);
    }

    #[test]
    fn composite_stays_in_range() {
        let steps = [0.0, 0.01, 1.15, 3.33, 5.0, 7.77, 9.99, 10.0];
        for &c in &steps {
            for &r in &steps {
                for &d in &steps {
                    for &g in &steps {
                        let score = composite(c, r, d, g);
                        let expected = round2(0.30 * c + 0.20 * r + 0.20 * d + 0.30 * g);
                        assert_eq!(score, expected);
                        assert!((0.0..=10.0).contains(&score));
                    }
                }
            }
        }
    }
}
