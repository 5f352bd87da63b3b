//! GPU frame-rate benchmark
//!
//! Clears an off-screen render target to an animated colour and waits for each frame to finish,
//! for a fixed wall-clock budget. A machine without a usable graphics capability scores 0; that
//! is an expected outcome and is reported as a warning.

use super::{guarded, BenchmarkKind, BenchmarkResult};
use crate::capability::GraphicsBackend;
use crate::error::BenchError;
use crate::log_sink::LogSink;
use crate::scoring::reference;
use std::time::{Duration, Instant};

pub const SURFACE_WIDTH: u32 = 1024;
pub const SURFACE_HEIGHT: u32 = 768;

/// Clear colour for a frame rendered `t` seconds into the run.
pub fn frame_color(t: f64) -> [f64; 4] {
    let r = ((t * 3.0).sin() - 1.0) / 2.0;
    [
        (r * 0.6).clamp(0.0, 1.0),
        (0.2 + 0.1 * r).clamp(0.0, 1.0),
        (1.0 - r * 0.6).clamp(0.0, 1.0),
        1.0,
    ]
}

/// Frames completed over a run
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRate {
    pub frames: u64,
    pub elapsed: Duration,
    pub adapter: String,
}

impl FrameRate {
    pub fn fps(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.frames as f64 / seconds
        } else {
            0.0
        }
    }

    pub fn into_result(self) -> BenchmarkResult {
        let fps = self.fps();
        BenchmarkResult::new(
            reference::GPU_FPS.score(fps),
            format!("{fps:.2} FPS on {}", self.adapter),
        )
    }
}

/// Render for `duration_secs` seconds on `backend`. Never fails; degraded runs score 0.
pub fn run_gpu_benchmark(
    backend: &dyn GraphicsBackend,
    duration_secs: f64,
    sink: &dyn LogSink,
) -> BenchmarkResult {
    sink.info("▶️ GPU: starting off-screen render benchmark...");
    tracing::debug!(backend = backend.name(), duration_secs, "gpu stage");

    guarded(BenchmarkKind::Gpu, sink, || {
        let frame_rate = render_for(backend, duration_secs)?;
        Ok(frame_rate.into_result())
    })
}

fn render_for(backend: &dyn GraphicsBackend, duration_secs: f64) -> Result<FrameRate, BenchError> {
    let budget = Duration::try_from_secs_f64(duration_secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| {
            BenchError::Measurement(format!("invalid render duration {duration_secs}s"))
        })?;

    let mut surface = backend.open_surface(SURFACE_WIDTH, SURFACE_HEIGHT)?;

    let start = Instant::now();
    let mut frames: u64 = 0;
    loop {
        let t = start.elapsed();
        if t >= budget {
            break;
        }
        surface.present(frame_color(t.as_secs_f64()))?;
        frames += 1;
    }
    let elapsed = start.elapsed();

    let adapter = surface.adapter_name().to_string();
    drop(surface);

    Ok(FrameRate {
        frames,
        elapsed,
        adapter,
    })
}
