//! Benchmark stages
//!
//! Each stage measures one subsystem and returns a [`BenchmarkResult`]. Stages are total: errors
//! and panics are converted into a zero score at the stage boundary, so callers never see a
//! failure from a single stage.

pub mod cpu;
pub mod disk;
pub mod gpu;
pub mod ram;

pub use cpu::run_cpu_benchmark;
pub use disk::run_disk_benchmark;
pub use gpu::run_gpu_benchmark;
pub use ram::run_ram_benchmark;

use crate::error::BenchError;
use crate::log_sink::LogSink;
use crate::scoring::{MAX_SCORE, WEIGHTS};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of a single stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Normalized score in `0..=10`
    pub score: f64,
    /// Human-readable summary of the raw measurement
    pub detail: String,
}

impl BenchmarkResult {
    pub fn new(score: f64, detail: impl Into<String>) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, MAX_SCORE)
        };
        Self {
            score,
            detail: detail.into(),
        }
    }

    /// Zero score carrying the reason the stage degraded.
    pub fn failed(detail: impl Into<String>) -> Self {
        let mut detail = detail.into();
        if detail.trim().is_empty() {
            detail = "unknown failure".to_string();
        }
        Self { score: 0.0, detail }
    }
}

/// The four benchmarked subsystems, in suite order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BenchmarkKind {
    Cpu,
    Ram,
    Disk,
    Gpu,
}

impl BenchmarkKind {
    pub const ALL: [BenchmarkKind; 4] = [
        BenchmarkKind::Cpu,
        BenchmarkKind::Ram,
        BenchmarkKind::Disk,
        BenchmarkKind::Gpu,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BenchmarkKind::Cpu => "CPU",
            BenchmarkKind::Ram => "RAM",
            BenchmarkKind::Disk => "Disk",
            BenchmarkKind::Gpu => "GPU",
        }
    }

    /// Weight of this stage in the composite score.
    pub fn weight(&self) -> f64 {
        match self {
            BenchmarkKind::Cpu => WEIGHTS.cpu,
            BenchmarkKind::Ram => WEIGHTS.ram,
            BenchmarkKind::Disk => WEIGHTS.disk,
            BenchmarkKind::Gpu => WEIGHTS.gpu,
        }
    }
}

impl fmt::Display for BenchmarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run a stage body, converting errors and panics into a zero score.
pub(crate) fn guarded<F>(kind: BenchmarkKind, sink: &dyn LogSink, body: F) -> BenchmarkResult
where
    F: FnOnce() -> Result<BenchmarkResult, BenchError>,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            let detail = err.to_string();
            if err.is_expected() {
                tracing::debug!(stage = kind.name(), "stage skipped: {detail}");
                sink.warning(&format!("{kind} benchmark skipped: {detail}"));
            } else {
                tracing::warn!(stage = kind.name(), "stage failed: {detail}");
                sink.error(&format!("{kind} benchmark failed: {detail}"));
            }
            BenchmarkResult::failed(detail)
        }
        Err(payload) => {
            let detail = format!("panic: {}", panic_message(payload.as_ref()));
            tracing::error!(stage = kind.name(), "stage panicked: {detail}");
            sink.error(&format!("{kind} benchmark failed: {detail}"));
            BenchmarkResult::failed(detail)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Throughput in MB/s, or `0.0` when the clock did not advance.
pub(crate) fn rate_mb_s(megabytes: f64, seconds: f64) -> f64 {
    if seconds > 0.0 {
        megabytes / seconds
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_sink::{LogLevel, MemorySink};

    #[test]
    fn result_scores_are_clamped() {
        assert_eq!(BenchmarkResult::new(12.5, "x").score, 10.0);
        assert_eq!(BenchmarkResult::new(-1.0, "x").score, 0.0);
        assert_eq!(BenchmarkResult::new(f64::NAN, "x").score, 0.0);
        assert_eq!(BenchmarkResult::new(4.2, "x").score, 4.2);
    }

    #[test]
    fn failed_result_always_has_detail() {
        let result = BenchmarkResult::failed("");
        assert_eq!(result.score, 0.0);
        assert!(!result.detail.is_empty());
    }

    #[test]
    fn kinds_are_in_suite_order() {
        let names: Vec<_> = BenchmarkKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, vec!["CPU", "RAM", "Disk", "GPU"]);
        let total: f64 = BenchmarkKind::ALL.iter().map(|k| k.weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn guarded_converts_expected_errors_to_warnings() {
        let sink = MemorySink::new();
        let result = guarded(BenchmarkKind::Gpu, &sink, || {
            Err(BenchError::ResourceUnavailable("graphics adapter".to_string()))
        });

        assert_eq!(result.score, 0.0);
        assert_eq!(result.detail, "missing graphics adapter");
        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, LogLevel::Warning);
    }

    #[test]
    fn guarded_converts_failures_to_errors() {
        let sink = MemorySink::new();
        let result = guarded(BenchmarkKind::Ram, &sink, || {
            Err(BenchError::Allocation { requested_mb: 512 })
        });

        assert_eq!(result.score, 0.0);
        assert!(result.detail.contains("512 MB"));
        assert_eq!(sink.entries()[0].0, LogLevel::Error);
    }

    #[test]
    fn guarded_catches_panics() {
        let sink = MemorySink::new();
        let result = guarded(BenchmarkKind::Cpu, &sink, || panic!("kernel exploded"));

        assert_eq!(result.score, 0.0);
        assert_eq!(result.detail, "panic: kernel exploded");
    }

    #[test]
    fn rate_is_zero_without_elapsed_time() {
        assert_eq!(rate_mb_s(100.0, 0.0), 0.0);
        assert_eq!(rate_mb_s(100.0, 2.0), 50.0);
    }
}
