//! Dependency-light kernels used when no accelerated numeric library is available.

use super::NumericBackend;
use crate::benchmark::cpu::{CpuMeasurement, HASH_ITERATIONS, HASH_SEED};
use crate::error::BenchError;
use sha2::{Digest, Sha256};
use std::hint::black_box;
use std::time::{Duration, Instant};

/// Sparse touch distance for the memory pass.
pub const PAGE_STRIDE: usize = 4096;

#[derive(Debug, Default, Clone, Copy)]
pub struct PortableBackend;

impl NumericBackend for PortableBackend {
    fn name(&self) -> &'static str {
        "portable"
    }

    fn cpu_workload(&self, _iter_mult: u32) -> Result<CpuMeasurement, BenchError> {
        let mut input = Vec::with_capacity(HASH_SEED.len() + 10);

        let start = Instant::now();
        for i in 0..HASH_ITERATIONS {
            input.clear();
            input.extend_from_slice(HASH_SEED);
            input.extend_from_slice(i.to_string().as_bytes());
            black_box(Sha256::digest(&input));
        }
        let elapsed = start.elapsed();

        Ok(CpuMeasurement::HashLoop {
            iterations: HASH_ITERATIONS,
            elapsed,
        })
    }

    fn memory_pass(&self, buffer: &mut [u8]) -> Result<Duration, BenchError> {
        let len = buffer.len();

        let start = Instant::now();
        for offset in (0..len).step_by(PAGE_STRIDE) {
            buffer[offset] = (offset % 256) as u8;
        }

        let mut sum: u64 = 0;
        for offset in (0..len).step_by(PAGE_STRIDE) {
            sum += u64::from(buffer[offset]);
        }
        let elapsed = start.elapsed();

        black_box(sum);
        Ok(elapsed)
    }
}
