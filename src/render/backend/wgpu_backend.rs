//! wgpu implementation of [`GpuBackend`]
//!
//! Programs are WGSL modules with a fixed binding convention:
//!
//! - `vs_main` / `fs_main` entry points; `fs_main` writes one `@location(i)`
//!   output per framebuffer attachment.
//! - `@group(0) @binding(0)`: `array<vec4<u32>, 64>` of uniforms, packed in
//!   declaration order. Scalars and vectors take one slot each (bitcast the
//!   float ones), a `mat4x4` takes four, an array one per element.
//! - `@group(1)`: texture unit `i` at binding `2i`, its sampler at `2i + 1`.
//!   Float32 surfaces are non-filterable unless the device says otherwise.

use std::collections::HashMap;

use log::{debug, info};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::render::backend::{
    DrawCall, FramebufferId, GpuBackend, Primitive, ProgramId, SurfaceId, UniformLocation, UniformValue,
    Viewport,
};
use crate::render::context::GpuContext;
use crate::render::program::ProgramSource;
use crate::render::target::{AttachmentSpec, Filter, PixelFormat, SurfaceData, Wrap};

/// Row pitch alignment for texture-to-buffer copies
const COPY_ROW_ALIGNMENT: u32 = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

/// Size of the per-draw uniform block in 16-byte slots
pub const UNIFORM_SLOTS: usize = 64;

struct GpuSurface {
    label: String,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    /// `None` for host-imported textures that are never attached
    format: Option<PixelFormat>,
    dimension: wgpu::TextureViewDimension,
    filterable: bool,
    width: u32,
    height: u32,
}

struct GpuProgram {
    label: String,
    module: wgpu::ShaderModule,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    targets: Vec<wgpu::TextureFormat>,
    primitive: Primitive,
    textures: Vec<(wgpu::TextureViewDimension, bool)>,
}

struct CachedPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
}

/// GPU backend drawing through wgpu render passes
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    next_id: u32,
    surfaces: HashMap<SurfaceId, GpuSurface>,
    framebuffers: HashMap<FramebufferId, Vec<SurfaceId>>,
    programs: HashMap<ProgramId, GpuProgram>,
    pipelines: HashMap<PipelineKey, CachedPipeline>,
}

impl WgpuBackend {
    pub fn new(context: &GpuContext) -> Self {
        Self {
            device: context.device.clone(),
            queue: context.queue.clone(),
            next_id: 1,
            surfaces: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// Upload a host-owned `R8` density field as a linearly filtered 3D texture
    pub fn import_volume(
        &mut self,
        label: &str,
        size: (u32, u32, u32),
        density: &[u8],
    ) -> Result<SurfaceId> {
        let (width, height, depth) = size;
        let expected = width as usize * height as usize * depth as usize;
        if density.len() != expected {
            return Err(Error::config(format!(
                "volume '{}' holds {} voxels, {}x{}x{} needs {}",
                label,
                density.len(),
                width,
                height,
                depth,
                expected
            )));
        }
        let limit = self.device.limits().max_texture_dimension_3d;
        if width.max(height).max(depth) > limit {
            return Err(Error::resource(format!(
                "volume '{}' exceeds the 3D texture limit of {}",
                label, limit
            )));
        }

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: depth,
        };
        let (texture, failure) = scoped(&self.device, || {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D3,
                format: wgpu::TextureFormat::R8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        });
        if let Some(e) = failure {
            texture.destroy();
            return Err(Error::resource(format!("volume '{}': {}", label, e)));
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            density,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width),
                rows_per_image: Some(height),
            },
            extent,
        );

        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let id = SurfaceId(self.allocate_id());
        self.surfaces.insert(
            id,
            GpuSurface {
                label: label.to_string(),
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                texture,
                sampler,
                format: None,
                dimension: wgpu::TextureViewDimension::D3,
                filterable: true,
                width,
                height,
            },
        );
        info!("Imported volume '{}' ({}x{}x{})", label, width, height, depth);
        Ok(id)
    }

    /// Upload a host-owned RGBA8 image, e.g. an environment map
    pub fn import_image(&mut self, label: &str, width: u32, height: u32, rgba: &[u8]) -> Result<SurfaceId> {
        let spec = AttachmentSpec::new(width, height, PixelFormat::Rgba8)
            .with_filter(Filter::Linear, Filter::Linear)
            .with_wrap(Wrap::Repeat, Wrap::ClampToEdge)
            .with_data(SurfaceData::Bytes(rgba.to_vec()));
        self.create_surface(label, &spec)
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn surface(&self, id: SurfaceId) -> Result<&GpuSurface> {
        self.surfaces
            .get(&id)
            .ok_or_else(|| Error::Gpu(format!("surface {:?} is not live", id)))
    }

    fn pipeline(&mut self, key: PipelineKey) -> Result<&CachedPipeline> {
        if !self.pipelines.contains_key(&key) {
            let program = self
                .programs
                .get(&key.program)
                .ok_or_else(|| Error::Gpu(format!("draw with unknown program {:?}", key.program)))?;
            let (cached, failure) = scoped(&self.device, || build_pipeline(&self.device, program, &key));
            if let Some(e) = failure {
                return Err(Error::Gpu(format!("pipeline for '{}': {}", program.label, e)));
            }
            debug!(
                "Built pipeline for '{}' ({} targets, {} textures)",
                program.label,
                key.targets.len(),
                key.textures.len()
            );
            self.pipelines.insert(key.clone(), cached);
        }
        self.pipelines
            .get(&key)
            .ok_or_else(|| Error::Gpu("pipeline cache miss".to_string()))
    }
}

impl GpuBackend for WgpuBackend {
    fn create_surface(&mut self, label: &str, spec: &AttachmentSpec) -> Result<SurfaceId> {
        spec.validate()?;
        let limit = self.device.limits().max_texture_dimension_2d;
        if spec.width > limit || spec.height > limit {
            return Err(Error::resource(format!(
                "'{}' is {}x{}, device limit is {}",
                label, spec.width, spec.height, limit
            )));
        }

        let format = spec.format.to_wgpu();
        let (texture, failure) = scoped(&self.device, || {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: spec.width,
                    height: spec.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            })
        });
        if let Some(e) = failure {
            texture.destroy();
            return Err(Error::resource(format!("surface '{}': {}", label, e)));
        }

        let filterable = format
            .guaranteed_format_features(self.device.features())
            .flags
            .contains(wgpu::TextureFormatFeatureFlags::FILTERABLE);
        let filter = |f: Filter| match f {
            Filter::Linear if filterable => wgpu::FilterMode::Linear,
            _ => wgpu::FilterMode::Nearest,
        };
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode(spec.wrap_s),
            address_mode_v: address_mode(spec.wrap_t),
            mag_filter: filter(spec.mag_filter),
            min_filter: filter(spec.min_filter),
            ..Default::default()
        });

        let id = SurfaceId(self.allocate_id());
        self.surfaces.insert(
            id,
            GpuSurface {
                label: label.to_string(),
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                texture,
                sampler,
                format: Some(spec.format),
                dimension: wgpu::TextureViewDimension::D2,
                filterable,
                width: spec.width,
                height: spec.height,
            },
        );

        if spec.initial_data.is_some() {
            self.write_surface(id, spec)?;
        }
        Ok(id)
    }

    fn write_surface(&mut self, surface: SurfaceId, spec: &AttachmentSpec) -> Result<()> {
        spec.validate()?;
        let target = self.surface(surface)?;
        if target.width != spec.width || target.height != spec.height || target.format != Some(spec.format) {
            return Err(Error::Gpu(format!("write layout mismatch on '{}'", target.label)));
        }
        let Some(data) = &spec.initial_data else {
            return Ok(());
        };

        let bytes = encode_surface_data(spec.format, data);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &target.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(spec.width * spec.format.bytes_per_pixel()),
                rows_per_image: Some(spec.height),
            },
            wgpu::Extent3d {
                width: spec.width,
                height: spec.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        match self.surfaces.remove(&surface) {
            Some(s) => s.texture.destroy(),
            None => log::warn!("Release of unknown surface {:?}", surface),
        }
    }

    fn create_framebuffer(&mut self, label: &str, attachments: &[SurfaceId]) -> Result<FramebufferId> {
        let limit = self.device.limits().max_color_attachments as usize;
        if attachments.len() > limit {
            return Err(Error::resource(format!(
                "framebuffer '{}' has {} attachments, device limit is {}",
                label,
                attachments.len(),
                limit
            )));
        }
        for attachment in attachments {
            let surface = self.surface(*attachment)?;
            if surface.format.is_none() {
                return Err(Error::resource(format!(
                    "'{}' cannot be attached to framebuffer '{}'",
                    surface.label, label
                )));
            }
        }
        let id = FramebufferId(self.allocate_id());
        self.framebuffers.insert(id, attachments.to_vec());
        Ok(id)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        if self.framebuffers.remove(&framebuffer).is_none() {
            log::warn!("Release of unknown framebuffer {:?}", framebuffer);
        }
    }

    fn create_program(&mut self, label: &str, source: &ProgramSource) -> Result<ProgramId> {
        if source.source.trim().is_empty() {
            return Err(Error::config(format!("program '{}' has no WGSL source", label)));
        }
        let (module, failure) = scoped(&self.device, || {
            self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.source.as_str().into()),
            })
        });
        if let Some(e) = failure {
            return Err(Error::config(format!("program '{}' does not compile: {}", label, e)));
        }
        let id = ProgramId(self.allocate_id());
        self.programs.insert(
            id,
            GpuProgram {
                label: label.to_string(),
                module,
            },
        );
        Ok(id)
    }

    fn destroy_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_none() {
            log::warn!("Release of unknown program {:?}", program);
        }
        self.pipelines.retain(|key, _| key.program != program);
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        let attachments = self
            .framebuffers
            .get(&call.framebuffer)
            .ok_or_else(|| Error::Gpu(format!("draw into unknown framebuffer {:?}", call.framebuffer)))?
            .clone();
        if call.draw_buffers as usize != attachments.len() {
            return Err(Error::Gpu(format!(
                "draw writes {} of {} attachments",
                call.draw_buffers,
                attachments.len()
            )));
        }
        if let Some(texture) = call.textures.iter().find(|t| attachments.contains(t)) {
            return Err(Error::Gpu(format!(
                "feedback loop: '{}' is sampled and written by the same draw",
                self.surface(*texture)?.label
            )));
        }

        let mut targets = Vec::with_capacity(attachments.len());
        for attachment in &attachments {
            let surface = self.surface(*attachment)?;
            targets.push(surface.format.map_or(wgpu::TextureFormat::Rgba8Unorm, PixelFormat::to_wgpu));
        }
        let mut textures = Vec::with_capacity(call.textures.len());
        for texture in call.textures {
            let surface = self.surface(*texture)?;
            textures.push((surface.dimension, surface.filterable));
        }

        let key = PipelineKey {
            program: call.program,
            targets,
            primitive: call.primitive,
            textures,
        };
        self.pipeline(key.clone())?;
        let cached = self
            .pipelines
            .get(&key)
            .ok_or_else(|| Error::Gpu("pipeline cache miss".to_string()))?;

        let slots = pack_uniforms(call.uniforms)?;
        let uniform_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniforms"),
            size: (slots.len() * 16) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue.write_buffer(&uniform_buffer, 0, bytemuck::cast_slice(&slots));

        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_uniforms_bg"),
            layout: &cached.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let mut entries = Vec::with_capacity(call.textures.len() * 2);
        for (unit, texture) in call.textures.iter().enumerate() {
            let surface = self.surfaces.get(texture).ok_or_else(|| {
                Error::Gpu(format!("texture {:?} is not live", texture))
            })?;
            entries.push(wgpu::BindGroupEntry {
                binding: unit as u32 * 2,
                resource: wgpu::BindingResource::TextureView(&surface.view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: unit as u32 * 2 + 1,
                resource: wgpu::BindingResource::Sampler(&surface.sampler),
            });
        }
        let texture_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_textures_bg"),
            layout: &cached.texture_layout,
            entries: &entries,
        });

        let mut color_attachments = Vec::with_capacity(attachments.len());
        for attachment in &attachments {
            let surface = self.surfaces.get(attachment).ok_or_else(|| {
                Error::Gpu(format!("attachment {:?} is not live", attachment))
            })?;
            color_attachments.push(Some(wgpu::RenderPassColorAttachment {
                view: &surface.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            }));
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("draw_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("draw_pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            let Viewport { x, y, width, height } = call.viewport;
            pass.set_viewport(x as f32, y as f32, width as f32, height as f32, 0.0, 1.0);
            pass.set_pipeline(&cached.pipeline);
            pass.set_bind_group(0, &uniform_bind_group, &[]);
            pass.set_bind_group(1, &texture_bind_group, &[]);
            pass.draw(0..call.vertex_count, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn read_pixels(&mut self, framebuffer: FramebufferId, viewport: Viewport) -> Result<Vec<f32>> {
        let first = self
            .framebuffers
            .get(&framebuffer)
            .and_then(|a| a.first())
            .copied()
            .ok_or_else(|| Error::Gpu(format!("readback from unknown framebuffer {:?}", framebuffer)))?;
        let surface = self.surface(first)?;
        let format = surface
            .format
            .ok_or_else(|| Error::Gpu(format!("'{}' is not readable", surface.label)))?;

        let bytes_per_pixel = format.bytes_per_pixel();
        let padded_bytes_per_row =
            (viewport.width * bytes_per_pixel).div_ceil(COPY_ROW_ALIGNMENT) * COPY_ROW_ALIGNMENT;
        let buffer_size = (padded_bytes_per_row * viewport.height) as u64;

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_staging"),
            size: buffer_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &surface.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: viewport.x,
                    y: viewport.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(viewport.height),
                },
            },
            wgpu::Extent3d {
                width: viewport.width,
                height: viewport.height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| Error::Gpu(format!("device poll failed: {:?}", e)))?;

        rx.recv()
            .map_err(|_| Error::Gpu("readback channel closed".to_string()))?
            .map_err(|e| Error::Gpu(format!("readback map failed: {:?}", e)))?;

        let data = slice.get_mapped_range();
        let pixels = decode_rows(&data, format, viewport.width, viewport.height, padded_bytes_per_row);
        drop(data);
        staging_buffer.unmap();
        Ok(pixels)
    }
}

fn address_mode(wrap: Wrap) -> wgpu::AddressMode {
    match wrap {
        Wrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        Wrap::Repeat => wgpu::AddressMode::Repeat,
        Wrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Run `create` under out-of-memory and validation error scopes
///
/// Errors caught here would otherwise reach the device's uncaptured-error
/// handler, which panics.
fn scoped<T>(device: &wgpu::Device, create: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
    let out_of_memory = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    let validation_error = pollster::block_on(validation.pop());
    let memory_error = pollster::block_on(out_of_memory.pop());
    (value, memory_error.or(validation_error))
}

fn build_pipeline(device: &wgpu::Device, program: &GpuProgram, key: &PipelineKey) -> CachedPipeline {
    let visibility = wgpu::ShaderStages::VERTEX_FRAGMENT;

    let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("draw_uniforms_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let mut entries = Vec::with_capacity(key.textures.len() * 2);
    for (unit, (dimension, filterable)) in key.textures.iter().enumerate() {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: unit as u32 * 2,
            visibility,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float {
                    filterable: *filterable,
                },
                view_dimension: *dimension,
                multisampled: false,
            },
            count: None,
        });
        let sampler = if *filterable {
            wgpu::SamplerBindingType::Filtering
        } else {
            wgpu::SamplerBindingType::NonFiltering
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: unit as u32 * 2 + 1,
            visibility,
            ty: wgpu::BindingType::Sampler(sampler),
            count: None,
        });
    }
    let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("draw_textures_layout"),
        entries: &entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&program.label),
        bind_group_layouts: &[&uniform_layout, &texture_layout],
        immediate_size: 0,
    });

    let targets: Vec<_> = key
        .targets
        .iter()
        .map(|format| {
            Some(wgpu::ColorTargetState {
                format: *format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect();

    let topology = match key.primitive {
        Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
        Primitive::Points => wgpu::PrimitiveTopology::PointList,
    };

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&program.label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &program.module,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &program.module,
            entry_point: Some("fs_main"),
            targets: &targets,
            compilation_options: Default::default(),
        }),
        multiview_mask: None,
        cache: None,
    });

    CachedPipeline {
        pipeline,
        uniform_layout,
        texture_layout,
    }
}

/// Pack uniform values into 16-byte slots ordered by location
fn pack_uniforms(uniforms: &[(UniformLocation, UniformValue)]) -> Result<Vec<[u32; 4]>> {
    let mut ordered: Vec<_> = uniforms.iter().collect();
    ordered.sort_by_key(|(location, _)| location.0);

    let mut slots = Vec::new();
    for (_, value) in ordered {
        match value {
            UniformValue::Int(v) => slots.push([*v as u32, 0, 0, 0]),
            UniformValue::Uint(v) => slots.push([*v, 0, 0, 0]),
            UniformValue::Float(v) => slots.push([v.to_bits(), 0, 0, 0]),
            UniformValue::Vec2([x, y]) => slots.push([x.to_bits(), y.to_bits(), 0, 0]),
            UniformValue::Vec3([x, y, z]) => slots.push([x.to_bits(), y.to_bits(), z.to_bits(), 0]),
            UniformValue::Mat4(m) => {
                for column in m.to_cols_array_2d() {
                    slots.push(column.map(f32::to_bits));
                }
            }
            UniformValue::Vec4Array(items) => {
                slots.extend(items.iter().map(|item| item.map(f32::to_bits)));
            }
        }
    }

    if slots.len() > UNIFORM_SLOTS {
        return Err(Error::Gpu(format!(
            "uniforms need {} slots, the block holds {}",
            slots.len(),
            UNIFORM_SLOTS
        )));
    }
    slots.resize(UNIFORM_SLOTS, [0; 4]);
    Ok(slots)
}

/// Serialize seed data in the surface's texel layout
fn encode_surface_data(format: PixelFormat, data: &SurfaceData) -> Vec<u8> {
    match data {
        SurfaceData::Bytes(bytes) => bytes.clone(),
        SurfaceData::Floats(floats) => match format.scalar_type() {
            crate::render::target::ScalarType::HalfFloat => floats
                .iter()
                .flat_map(|f| half::f16::from_f32(*f).to_bits().to_le_bytes())
                .collect(),
            _ => bytemuck::cast_slice(floats).to_vec(),
        },
    }
}

/// Expand tightly packed rows of `format` texels to RGBA floats
fn decode_rows(data: &[u8], format: PixelFormat, width: u32, height: u32, padded_bytes_per_row: u32) -> Vec<f32> {
    let channels = format.channels() as usize;
    let bytes_per_pixel = format.bytes_per_pixel() as usize;
    let scalar_bytes = bytes_per_pixel / channels;

    let mut out = vec![0.0; width as usize * height as usize * 4];
    for row in 0..height as usize {
        let row_start = row * padded_bytes_per_row as usize;
        for col in 0..width as usize {
            let texel = row * width as usize + col;
            let pixel_start = row_start + col * bytes_per_pixel;
            for c in 0..channels {
                let offset = pixel_start + c * scalar_bytes;
                let Some(raw) = data.get(offset..offset + scalar_bytes) else {
                    continue;
                };
                out[texel * 4 + c] = match scalar_bytes {
                    1 => raw[0] as f32 / 255.0,
                    2 => half::f16::from_bits(u16::from_le_bytes([raw[0], raw[1]])).to_f32(),
                    _ => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
                };
            }
        }
    }
    out
}
