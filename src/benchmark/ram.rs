//! RAM bandwidth benchmark

use super::{guarded, rate_mb_s, BenchmarkKind, BenchmarkResult};
use crate::capability::NumericBackend;
use crate::error::BenchError;
use crate::log_sink::LogSink;
use crate::scoring::reference;
use std::time::Duration;
use sysinfo::System;

pub const BYTES_PER_MB: usize = 1024 * 1024;

/// Whole megabytes needed to hold `bytes`.
pub fn allocation_mb(bytes: usize) -> u64 {
    (bytes / BYTES_PER_MB + usize::from(bytes % BYTES_PER_MB != 0)) as u64
}

/// Allocate a zeroed buffer of `size_mb` MiB without aborting on exhaustion.
///
/// Requests larger than the machine's physical memory are refused up front; on overcommitting
/// kernels the reservation alone would otherwise succeed and the process be killed mid-pass.
pub fn allocate(size_mb: u64) -> Result<Vec<u8>, BenchError> {
    let refused = BenchError::Allocation {
        requested_mb: size_mb,
    };

    let bytes = usize::try_from(size_mb)
        .ok()
        .and_then(|mb| mb.checked_mul(BYTES_PER_MB))
        .ok_or(BenchError::Allocation {
            requested_mb: size_mb,
        })?;

    let mut sys = System::new();
    sys.refresh_memory();
    let total = sys.total_memory();
    if total > 0 && bytes as u64 > total {
        return Err(refused);
    }

    let mut buffer: Vec<u8> = Vec::new();
    buffer.try_reserve_exact(bytes).map_err(|_| refused)?;
    // Fault every page in before the timed window.
    buffer.resize(bytes, 0);
    Ok(buffer)
}

fn bandwidth_result(size_mb: u64, elapsed: Duration) -> BenchmarkResult {
    let seconds = elapsed.as_secs_f64();
    let mb_s = rate_mb_s(size_mb as f64, seconds);
    BenchmarkResult::new(
        reference::RAM_MB_S.score(mb_s),
        format!("{mb_s:.2} MB/s ({seconds:.2}s)"),
    )
}

/// Run the RAM stage with a `size_mb` MiB buffer. Never fails; degraded runs score 0.
pub fn run_ram_benchmark(
    backend: &dyn NumericBackend,
    size_mb: u64,
    sink: &dyn LogSink,
) -> BenchmarkResult {
    sink.info(&format!("▶️ RAM: testing {size_mb} MB allocation..."));
    tracing::debug!(backend = backend.name(), size_mb, "ram stage");

    guarded(BenchmarkKind::Ram, sink, || {
        if size_mb == 0 {
            return Err(BenchError::Measurement(
                "buffer size must be at least 1 MB".to_string(),
            ));
        }

        let mut buffer = allocate(size_mb)?;
        let elapsed = backend.memory_pass(&mut buffer)?;
        Ok(bandwidth_result(size_mb, elapsed))
    })
}
