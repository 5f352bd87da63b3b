//! CPU benchmark
//!
//! Accelerated backends time a dense f32 matrix multiply and report GFLOPS; the portable backend
//! times a fixed SHA-256 loop. The two paths score against different reference ranges because
//! their units differ.

use super::{guarded, BenchmarkKind, BenchmarkResult};
use crate::capability::NumericBackend;
use crate::log_sink::LogSink;
use crate::scoring::{reference, ReferenceRange};
use std::time::Duration;

/// Matrix side for `iter_mult == 1`.
pub const BASE_MATRIX_SIDE: usize = 1000;
/// Upper bound on the matrix side (three 3000x3000 f32 matrices is ~100 MB).
pub const MAX_MATRIX_SIDE: usize = 3000;
/// Digests computed by the portable workload.
pub const HASH_ITERATIONS: u32 = 200_000;
/// Prefix hashed together with the iteration counter.
pub const HASH_SEED: &[u8] = b"benchmark";

const MIN_HASH_SECONDS: f64 = 0.0001;

/// Matrix side for a size multiplier; `0` is treated as `1`.
pub fn matrix_side(iter_mult: u32) -> usize {
    let mult = iter_mult.max(1) as usize;
    BASE_MATRIX_SIDE.saturating_mul(mult).min(MAX_MATRIX_SIDE)
}

/// What a numeric backend actually measured
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CpuMeasurement {
    /// `n x n` by `n x n` f32 multiply
    MatrixMultiply { n: usize, elapsed: Duration },
    /// Fixed number of SHA-256 digests
    HashLoop { iterations: u32, elapsed: Duration },
}

impl CpuMeasurement {
    /// Raw metric fed to the normalizer (GFLOPS, or loops per second).
    pub fn raw_metric(&self) -> f64 {
        match *self {
            CpuMeasurement::MatrixMultiply { n, elapsed } => {
                let n = n as f64;
                let flops = 2.0 * n * n * n;
                let seconds = elapsed.as_secs_f64().max(f64::EPSILON);
                flops / (seconds * 1e9)
            }
            CpuMeasurement::HashLoop { elapsed, .. } => {
                1.0 / elapsed.as_secs_f64().max(MIN_HASH_SECONDS)
            }
        }
    }

    pub fn reference(&self) -> ReferenceRange {
        match self {
            CpuMeasurement::MatrixMultiply { .. } => reference::CPU_GFLOPS,
            CpuMeasurement::HashLoop { .. } => reference::CPU_HASH_RATE,
        }
    }

    pub fn detail(&self) -> String {
        match *self {
            CpuMeasurement::MatrixMultiply { elapsed, .. } => format!(
                "{:.2} GFLOPS (time {:.2}s)",
                self.raw_metric(),
                elapsed.as_secs_f64()
            ),
            CpuMeasurement::HashLoop {
                iterations,
                elapsed,
            } => format!(
                "hash loop {iterations} iters in {:.2}s",
                elapsed.as_secs_f64()
            ),
        }
    }

    pub fn into_result(self) -> BenchmarkResult {
        BenchmarkResult::new(self.reference().score(self.raw_metric()), self.detail())
    }
}

/// Run the CPU stage on `backend`. Never fails; degraded runs score 0.
pub fn run_cpu_benchmark(
    backend: &dyn NumericBackend,
    iter_mult: u32,
    sink: &dyn LogSink,
) -> BenchmarkResult {
    sink.info("▶️ CPU: starting synthetic benchmark...");
    tracing::debug!(backend = backend.name(), iter_mult, "cpu stage");

    guarded(BenchmarkKind::Cpu, sink, || {
        let measurement = backend.cpu_workload(iter_mult)?;
        Ok(measurement.into_result())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::PortableBackend;
    use crate::error::BenchError;
    use crate::log_sink::MemorySink;

    struct FailingBackend;

    impl NumericBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn cpu_workload(&self, _iter_mult: u32) -> Result<CpuMeasurement, BenchError> {
            Err(BenchError::Allocation { requested_mb: 34 })
        }

        fn memory_pass(&self, _buffer: &mut [u8]) -> Result<Duration, BenchError> {
            Err(BenchError::Measurement("unused".to_string()))
        }
    }

    struct PanickingBackend;

    impl NumericBackend for PanickingBackend {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn cpu_workload(&self, _iter_mult: u32) -> Result<CpuMeasurement, BenchError> {
            panic!("matrix kernel aborted")
        }

        fn memory_pass(&self, _buffer: &mut [u8]) -> Result<Duration, BenchError> {
            panic!("unused")
        }
    }

    #[test]
    fn matrix_side_is_capped() {
        assert_eq!(matrix_side(0), 1000);
        assert_eq!(matrix_side(1), 1000);
        assert_eq!(matrix_side(2), 2000);
        assert_eq!(matrix_side(3), 3000);
        assert_eq!(matrix_side(4), 3000);
        assert_eq!(matrix_side(u32::MAX), 3000);
    }

    #[test]
    fn matrix_multiply_scores_against_gflops_range() {
        // 2 * 1000^3 flops in 16 ms is 125 GFLOPS.
        let measurement = CpuMeasurement::MatrixMultiply {
            n: 1000,
            elapsed: Duration::from_millis(16),
        };
        assert!((measurement.raw_metric() - 125.0).abs() < 1e-6);

        let result = measurement.into_result();
        assert_eq!(result.score, 1.15);
        assert_eq!(result.detail, "125.00 GFLOPS (time 0.02s)");
    }

    #[test]
    fn hash_loop_scores_against_rate_range() {
        let measurement = CpuMeasurement::HashLoop {
            iterations: HASH_ITERATIONS,
            elapsed: Duration::from_secs(2),
        };
        let result = measurement.into_result();
        assert_eq!(result.score, 4.95);
        assert_eq!(result.detail, "hash loop 200000 iters in 2.00s");
    }

    #[test]
    fn instant_hash_loop_is_capped_not_infinite() {
        let measurement = CpuMeasurement::HashLoop {
            iterations: HASH_ITERATIONS,
            elapsed: Duration::ZERO,
        };
        assert!((measurement.raw_metric() - 10_000.0).abs() < 1e-6);
        assert_eq!(measurement.into_result().score, 10.0);
    }

    #[test]
    fn allocation_failure_scores_zero() {
        let sink = MemorySink::new();
        let result = run_cpu_benchmark(&FailingBackend, 1, &sink);
        assert_eq!(result.score, 0.0);
        assert!(result.detail.contains("allocation"));
    }

    #[test]
    fn panicking_backend_scores_zero() {
        let sink = MemorySink::new();
        let result = run_cpu_benchmark(&PanickingBackend, 1, &sink);
        assert_eq!(result.score, 0.0);
        assert!(result.detail.contains("matrix kernel aborted"));
    }

    #[test]
    fn portable_backend_produces_a_score() {
        let sink = MemorySink::new();
        let result = run_cpu_benchmark(&PortableBackend, 1, &sink);
        assert!((0.0..=10.0).contains(&result.score));
        assert!(result.detail.starts_with("hash loop 200000 iters in"));
        assert_eq!(sink.messages()[0], "▶️ CPU: starting synthetic benchmark...");
    }
}
