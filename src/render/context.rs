//! Headless GPU context management using wgpu

use crate::core::error::Error;

/// Color attachments a single pass may write
///
/// The widest variant writes five `Rgba32Float` surfaces at once.
pub const REQUIRED_COLOR_ATTACHMENTS: u32 = 5;

/// GPU device without a presentation surface
pub struct GpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquire an adapter and device suitable for offscreen rendering
    pub async fn new() -> Result<Self, Error> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Gpu(format!("No suitable adapter found: {:?}", e)))?;

        let adapter_limits = adapter.limits();
        if adapter_limits.max_color_attachments < REQUIRED_COLOR_ATTACHMENTS {
            return Err(Error::Gpu(format!(
                "adapter supports {} color attachments, need {}",
                adapter_limits.max_color_attachments, REQUIRED_COLOR_ATTACHMENTS
            )));
        }

        let device_desc = wgpu::DeviceDescriptor {
            label: Some("voltrace_device"),
            required_features: wgpu::Features::FLOAT32_FILTERABLE
                & adapter.features(),
            required_limits: wgpu::Limits {
                max_color_attachments: REQUIRED_COLOR_ATTACHMENTS,
                // 5 x Rgba32Float = 80 bytes per sample
                max_color_attachment_bytes_per_sample: adapter_limits
                    .max_color_attachment_bytes_per_sample,
                max_texture_dimension_2d: adapter_limits.max_texture_dimension_2d,
                max_texture_dimension_3d: adapter_limits.max_texture_dimension_3d,
                max_buffer_size: adapter_limits.max_buffer_size,
                ..Default::default()
            },
            memory_hints: wgpu::MemoryHints::Performance,
            experimental_features: Default::default(),
            trace: Default::default(),
        };

        let (device, queue) = adapter
            .request_device(&device_desc)
            .await
            .map_err(|e| Error::Gpu(e.to_string()))?;

        let info = adapter.get_info();
        log::info!(
            "GPU: {} ({:?}), max 2D texture {}px, {} bytes per sample",
            info.name,
            info.backend,
            adapter_limits.max_texture_dimension_2d,
            adapter_limits.max_color_attachment_bytes_per_sample
        );

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Blocking variant of [`GpuContext::new`]
    pub fn new_blocking() -> Result<Self, Error> {
        pollster::block_on(Self::new())
    }

    pub fn limits(&self) -> wgpu::Limits {
        self.device.limits()
    }
}
