//! ndarray-backed kernels: blocked f32 GEMM and whole-buffer fill/reduce.

use super::NumericBackend;
use crate::benchmark::cpu::{matrix_side, CpuMeasurement};
use crate::benchmark::ram::allocation_mb;
use crate::error::BenchError;
use ndarray::linalg::general_mat_mul;
use ndarray::{Array2, ArrayViewMut1};
use rand::Rng;
use std::hint::black_box;
use std::time::{Duration, Instant};

/// Constant written across the buffer during the memory pass.
const FILL_BYTE: u8 = 123;

#[derive(Debug, Default, Clone, Copy)]
pub struct AcceleratedBackend;

impl NumericBackend for AcceleratedBackend {
    fn name(&self) -> &'static str {
        "ndarray"
    }

    fn cpu_workload(&self, iter_mult: u32) -> Result<CpuMeasurement, BenchError> {
        let n = matrix_side(iter_mult);
        let mut rng = rand::thread_rng();

        let a = matrix_with(n, |_| rng.gen::<f32>())?;
        let b = matrix_with(n, |_| rng.gen::<f32>())?;
        let mut c = matrix_with(n, |_| 0.0)?;

        let elapsed = timed_product(&a, &b, &mut c);

        black_box(&c);
        Ok(CpuMeasurement::MatrixMultiply { n, elapsed })
    }

    fn memory_pass(&self, buffer: &mut [u8]) -> Result<Duration, BenchError> {
        let start = Instant::now();
        let mut view = ArrayViewMut1::from(buffer);
        view.fill(FILL_BYTE);
        let sum = view.fold(0u64, |acc, &byte| acc + u64::from(byte));
        let elapsed = start.elapsed();

        black_box(sum);
        Ok(elapsed)
    }
}

/// `c = a * b`, timed. matrixmultiply splits the kernel across its worker threads.
fn timed_product(a: &Array2<f32>, b: &Array2<f32>, c: &mut Array2<f32>) -> Duration {
    let start = Instant::now();
    general_mat_mul(1.0, a, b, 0.0, c);
    start.elapsed()
}

/// Build an `n x n` matrix without aborting the process when memory runs out.
fn matrix_with(n: usize, mut fill: impl FnMut(usize) -> f32) -> Result<Array2<f32>, BenchError> {
    let len = n
        .checked_mul(n)
        .ok_or_else(|| BenchError::Measurement(format!("matrix side {n} overflows")))?;

    let mut data: Vec<f32> = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| BenchError::Allocation {
            requested_mb: allocation_mb(len.saturating_mul(std::mem::size_of::<f32>())),
        })?;
    data.extend((0..len).map(&mut fill));

    Array2::from_shape_vec((n, n), data).map_err(|e| BenchError::Measurement(e.to_string()))
}
