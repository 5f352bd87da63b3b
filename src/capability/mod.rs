//! Optional-capability dispatch
//!
//! The CPU and RAM benchmarks run against a [`NumericBackend`], the GPU benchmark against a
//! [`GraphicsBackend`]. [`Capabilities::probe`] is the single place that decides which
//! implementation is used, based on the compiled features and the `[backends]` config section.

#[cfg(feature = "accelerated")]
mod accelerated;
mod graphics;
mod portable;

#[cfg(feature = "accelerated")]
pub use accelerated::AcceleratedBackend;
#[cfg(feature = "gpu")]
pub use graphics::WgpuGraphics;
pub use graphics::{GraphicsBackend, RenderSurface, UnavailableGraphics};
pub use portable::PortableBackend;

use crate::benchmark::cpu::CpuMeasurement;
use crate::config::{BackendConfig, GraphicsPreference, NumericPreference};
use crate::error::BenchError;
use std::time::Duration;

/// Numeric kernels used by the CPU and RAM benchmarks.
pub trait NumericBackend: Send + Sync {
    /// Short label recorded in results (e.g., "ndarray", "portable").
    fn name(&self) -> &'static str;

    /// Run the CPU workload for the given size multiplier and report what was measured.
    fn cpu_workload(&self, iter_mult: u32) -> Result<CpuMeasurement, BenchError>;

    /// Write then read `buffer` and return the elapsed time of both passes.
    fn memory_pass(&self, buffer: &mut [u8]) -> Result<Duration, BenchError>;
}

/// Backends selected for a run
pub struct Capabilities {
    pub numeric: Box<dyn NumericBackend>,
    pub graphics: Box<dyn GraphicsBackend>,
}

impl Capabilities {
    /// Detect available capabilities, honoring configured preferences.
    pub fn probe(config: &BackendConfig) -> Self {
        let numeric = Self::probe_numeric(config.numeric);
        let graphics = Self::probe_graphics(config.graphics);

        tracing::debug!(
            numeric = numeric.name(),
            graphics = graphics.name(),
            "capability probe complete"
        );

        Self { numeric, graphics }
    }

    /// Portable numeric kernels and no graphics.
    pub fn portable() -> Self {
        Self {
            numeric: Box::new(PortableBackend),
            graphics: Box::new(UnavailableGraphics::new("graphics support (disabled)")),
        }
    }

    fn probe_numeric(preference: NumericPreference) -> Box<dyn NumericBackend> {
        match preference {
            NumericPreference::Portable => Box::new(PortableBackend),
            NumericPreference::Auto => {
                #[cfg(feature = "accelerated")]
                {
                    Box::new(AcceleratedBackend)
                }

                #[cfg(not(feature = "accelerated"))]
                {
                    Box::new(PortableBackend)
                }
            }
        }
    }

    fn probe_graphics(preference: GraphicsPreference) -> Box<dyn GraphicsBackend> {
        match preference {
            GraphicsPreference::Disabled => {
                Box::new(UnavailableGraphics::new("graphics support (disabled in config)"))
            }
            GraphicsPreference::Auto => {
                #[cfg(feature = "gpu")]
                {
                    Box::new(WgpuGraphics::new())
                }

                #[cfg(not(feature = "gpu"))]
                {
                    Box::new(UnavailableGraphics::new("graphics support (built without wgpu)"))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portable_preference_always_selects_portable_kernels() {
        let config = BackendConfig {
            numeric: NumericPreference::Portable,
            graphics: GraphicsPreference::Disabled,
        };
        let caps = Capabilities::probe(&config);
        assert_eq!(caps.numeric.name(), "portable");
        assert_eq!(caps.graphics.name(), "unavailable");
    }

    #[test]
    fn auto_preference_follows_compiled_features() {
        let caps = Capabilities::probe(&BackendConfig::default());

        if cfg!(feature = "accelerated") {
            assert_eq!(caps.numeric.name(), "ndarray");
        } else {
            assert_eq!(caps.numeric.name(), "portable");
        }

        if cfg!(feature = "gpu") {
            assert_eq!(caps.graphics.name(), "wgpu");
        } else {
            assert_eq!(caps.graphics.name(), "unavailable");
        }
    }
}
