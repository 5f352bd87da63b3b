//! Graphics backends for the GPU frame-rate benchmark.

use crate::error::BenchError;

/// Creates off-screen render targets.
pub trait GraphicsBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Acquire a device and an invisible `width x height` render target.
    fn open_surface(&self, width: u32, height: u32) -> Result<Box<dyn RenderSurface>, BenchError>;
}

/// An off-screen render target. Dropping it releases the device.
pub trait RenderSurface {
    /// Human-readable name of the adapter backing this surface.
    fn adapter_name(&self) -> &str;

    /// Clear the target to `rgba` and block until the frame has completed on the device.
    fn present(&mut self, rgba: [f64; 4]) -> Result<(), BenchError>;
}

/// Stands in when no graphics capability is available; every open reports why.
#[derive(Debug, Clone)]
pub struct UnavailableGraphics {
    reason: String,
}

impl UnavailableGraphics {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl GraphicsBackend for UnavailableGraphics {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn open_surface(&self, _width: u32, _height: u32) -> Result<Box<dyn RenderSurface>, BenchError> {
        Err(BenchError::ResourceUnavailable(self.reason.clone()))
    }
}

#[cfg(feature = "gpu")]
pub use self::wgpu_backend::WgpuGraphics;

#[cfg(feature = "gpu")]
mod wgpu_backend {
    use super::{GraphicsBackend, RenderSurface};
    use crate::error::BenchError;
    use std::sync::{Arc, Mutex};

    const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    /// Headless wgpu device rendering into a texture (no window, no swapchain).
    #[derive(Debug, Default)]
    pub struct WgpuGraphics;

    impl WgpuGraphics {
        pub fn new() -> Self {
            Self
        }
    }

    impl GraphicsBackend for WgpuGraphics {
        fn name(&self) -> &'static str {
            "wgpu"
        }

        fn open_surface(
            &self,
            width: u32,
            height: u32,
        ) -> Result<Box<dyn RenderSurface>, BenchError> {
            // Adapter/device requests are futures; nothing else here is async.
            let runtime = tokio::runtime::Builder::new_current_thread().build()?;

            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });

            let adapter = runtime
                .block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                }))
                .ok_or_else(|| BenchError::ResourceUnavailable("graphics adapter".to_string()))?;

            let adapter_info = adapter.get_info();
            tracing::debug!(
                adapter = %adapter_info.name,
                backend = ?adapter_info.backend,
                "graphics adapter selected"
            );

            let (device, queue) = runtime
                .block_on(adapter.request_device(
                    &wgpu::DeviceDescriptor {
                        label: Some("hwbench_gpu"),
                        required_features: wgpu::Features::empty(),
                        required_limits: wgpu::Limits::downlevel_defaults(),
                        memory_hints: Default::default(),
                    },
                    None,
                ))
                .map_err(|e| BenchError::ResourceUnavailable(format!("graphics device ({e})")))?;

            let device_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
            let sink = Arc::clone(&device_error);
            device.on_uncaptured_error(Box::new(move |err: wgpu::Error| {
                tracing::error!("wgpu device error: {err}");
                if let Ok(mut slot) = sink.lock() {
                    slot.get_or_insert_with(|| err.to_string());
                }
            }));

            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some("hwbench_frame"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: TARGET_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

            Ok(Box::new(WgpuSurface {
                adapter_name: adapter_info.name,
                device,
                queue,
                _texture: texture,
                view,
                device_error,
            }))
        }
    }

    struct WgpuSurface {
        adapter_name: String,
        device: wgpu::Device,
        queue: wgpu::Queue,
        _texture: wgpu::Texture,
        view: wgpu::TextureView,
        device_error: Arc<Mutex<Option<String>>>,
    }

    impl RenderSurface for WgpuSurface {
        fn adapter_name(&self) -> &str {
            &self.adapter_name
        }

        fn present(&mut self, rgba: [f64; 4]) -> Result<(), BenchError> {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("hwbench_frame_encoder"),
                });

            {
                let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("hwbench_clear"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &self.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: rgba[0],
                                g: rgba[1],
                                b: rgba[2],
                                a: rgba[3],
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            }

            self.queue.submit(Some(encoder.finish()));
            let _ = self.device.poll(wgpu::Maintain::Wait);

            let failure = match self.device_error.lock() {
                Ok(slot) => slot.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            match failure {
                Some(message) => Err(BenchError::Measurement(message)),
                None => Ok(()),
            }
        }
    }
}
