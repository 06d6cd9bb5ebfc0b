use std::collections::HashMap;

use anyhow::{Context, Result};
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::pipeline::{
    capture_validation, create_pipeline, BindLayouts, GlobalsUniform, ObjectUniform, PipelineKey, ProgramModules,
    GLOBALS_SIZE, OBJECT_SIZE,
};
use super::surface::{choose_alpha_mode, choose_surface_format, SurfaceState};
use super::topology::expand_indices;
use super::{
    BufferId, FramePlan, GpuInit, GraphicsDevice, ProgramId, SurfaceErrorAction, TextureId,
};
use crate::error::RenderError;
use crate::geometry::{Topology, VertexLayout};
use crate::shader::LinkedProgram;
use crate::texture::DecodedImage;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct GpuBuffer {
    vertices: wgpu::Buffer,
    /// Emulated topologies draw through an index list.
    indices: Option<(wgpu::Buffer, u32)>,
    layout: VertexLayout,
    topology: Topology,
    vertex_count: u32,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct DepthTarget {
    view: wgpu::TextureView,
    size: PhysicalSize<u32>,
}

/// Per-draw uniform ring sized to the largest frame seen so far.
struct ObjectSlots {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
}

/// wgpu-backed [`GraphicsDevice`] bound to a window surface.
///
/// Owns the instance, adapter, device, queue and surface, plus every object
/// the engine created through the trait. Render pipelines are created lazily
/// per program, vertex layout, topology and depth mode; a key whose pipeline
/// failed validation is remembered as `None` and its draws are skipped.
pub struct Gpu<'w> {
    _instance: wgpu::Instance,
    _adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: SurfaceState<'w>,
    depth_format: wgpu::TextureFormat,

    layouts: BindLayouts,
    sampler: wgpu::Sampler,
    placeholder: GpuTexture,
    globals: wgpu::Buffer,
    objects: ObjectSlots,
    depth: Option<DepthTarget>,

    next_id: u32,
    programs: HashMap<ProgramId, ProgramModules>,
    buffers: HashMap<BufferId, GpuBuffer>,
    textures: HashMap<TextureId, Option<GpuTexture>>,
    pipelines: HashMap<PipelineKey, Option<wgpu::RenderPipeline>>,
    diagnostics: Vec<String>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to `window`.
    ///
    /// Fails if the window has no area or no adapter can present to it.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("lumen device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        let surface = SurfaceState::new(surface, config, size);
        surface.configure(&device);

        log::info!(
            "gpu ready: {} ({:?}), surface {:?} {}x{}",
            adapter.get_info().name,
            adapter.get_info().backend,
            format,
            size.width,
            size.height
        );

        let layouts = BindLayouts::new(&device);

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lumen linear sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let placeholder = upload_texture(
            &device,
            &queue,
            &layouts,
            &sampler,
            &DecodedImage::solid([255, 255, 255, 255]),
            "lumen placeholder texture",
        )
        .map_err(|err| anyhow::anyhow!("placeholder texture rejected: {err}"))?;

        let initial = GlobalsUniform {
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let globals = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen globals ubo"),
            contents: bytemuck::bytes_of(&initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let objects = ObjectSlots::new(&device, &layouts, &globals, 4);

        Ok(Gpu {
            _instance: instance,
            _adapter: adapter,
            device,
            queue,
            surface,
            depth_format: init.depth_format,
            layouts,
            sampler,
            placeholder,
            globals,
            objects,
            depth: None,
            next_id: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            pipelines: HashMap::new(),
            diagnostics: Vec::new(),
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface.format()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_object_slots(&mut self, draws: usize) {
        if self.objects.capacity >= draws {
            return;
        }
        let capacity = draws.next_power_of_two();
        log::debug!("growing object uniforms to {capacity} slots");
        self.objects = ObjectSlots::new(&self.device, &self.layouts, &self.globals, capacity);
    }

    fn ensure_depth(&mut self) {
        let size = self.surface.size();
        if self.depth.as_ref().is_some_and(|d| d.size == size) {
            return;
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lumen depth"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.depth_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some(DepthTarget { view, size });
    }

    /// `false` if the key has no usable pipeline; the first failure per key
    /// is queued as a diagnostic.
    fn ensure_pipeline(&mut self, key: PipelineKey) -> bool {
        if let Some(cached) = self.pipelines.get(&key) {
            return cached.is_some();
        }
        let Some(modules) = self.programs.get(&key.program) else {
            log::warn!("draw references unknown program {:?}", key.program);
            return false;
        };
        let created = create_pipeline(
            &self.device,
            &self.layouts,
            modules,
            key,
            self.surface.format(),
            self.depth_format,
        );
        let pipeline = match created {
            Ok(pipeline) => Some(pipeline),
            Err(err) => {
                let message = format!("[{}] pipeline creation failed: {err}", modules.label);
                log::error!("{message}");
                self.diagnostics.push(message);
                None
            }
        };
        let usable = pipeline.is_some();
        self.pipelines.insert(key, pipeline);
        usable
    }

    fn write_uniforms(&mut self, plan: &FramePlan) {
        if let Some(projection) = plan.projection {
            let cols = projection.to_cols_array_2d();
            self.queue.write_buffer(&self.globals, 0, bytemuck::bytes_of(&cols));
        }
        let view = plan.camera.to_cols_array_2d();
        self.queue
            .write_buffer(&self.globals, GLOBALS_SIZE / 2, bytemuck::bytes_of(&view));

        if plan.draws.is_empty() {
            return;
        }
        let slots = &self.objects;
        let mut staging = vec![0u8; slots.stride as usize * plan.draws.len()];
        for (i, draw) in plan.draws.iter().enumerate() {
            let textured = draw.texture.is_some_and(|t| matches!(self.textures.get(&t), Some(Some(_))));
            let uniform = ObjectUniform::new(draw.model, textured);
            let start = i * slots.stride as usize;
            staging[start..start + OBJECT_SIZE as usize].copy_from_slice(bytemuck::bytes_of(&uniform));
        }
        self.queue.write_buffer(&slots.buffer, 0, &staging);
    }
}

impl ObjectSlots {
    fn new(
        device: &wgpu::Device,
        layouts: &BindLayouts,
        globals: &wgpu::Buffer,
        capacity: usize,
    ) -> Self {
        let align = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let stride = OBJECT_SIZE.div_ceil(align) * align;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lumen object ubo"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen uniforms bind group"),
            layout: &layouts.uniforms,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: wgpu::BufferSize::new(OBJECT_SIZE),
                    }),
                },
            ],
        });

        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layouts: &BindLayouts,
    sampler: &wgpu::Sampler,
    image: &DecodedImage,
    label: &str,
) -> Result<GpuTexture, wgpu::Error> {
    capture_validation(device, || {
        upload_texture_unchecked(device, queue, layouts, sampler, image, label)
    })
}

fn upload_texture_unchecked(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layouts: &BindLayouts,
    sampler: &wgpu::Sampler,
    image: &DecodedImage,
    label: &str,
) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: image.width,
        height: image.height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.row_bytes()),
            rows_per_image: Some(image.height),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: &layouts.texture,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    GpuTexture {
        _texture: texture,
        bind_group,
    }
}

impl GraphicsDevice for Gpu<'_> {
    fn surface_size(&self) -> PhysicalSize<u32> {
        self.surface.size()
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.surface.resize(&self.device, size);
    }

    fn create_program(&mut self, program: &LinkedProgram) -> Result<ProgramId, RenderError> {
        let modules = ProgramModules::new(&self.device, program).map_err(|err| {
            RenderError::ProgramLink {
                message: format!("device rejected shader modules: {err}"),
            }
        })?;
        let id = ProgramId(self.next());
        self.programs.insert(id, modules);
        Ok(id)
    }

    fn create_vertex_buffer(
        &mut self,
        vertices: &[f32],
        layout: VertexLayout,
        topology: Topology,
    ) -> BufferId {
        let id = BufferId(self.next());
        let vertex_count = (vertices.len() / layout.stride()) as u32;

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen vertex buffer"),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices = expand_indices(topology, vertex_count).map(|indices| {
            let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen index buffer"),
                contents: bytemuck::cast_slice(&indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (buffer, indices.len() as u32)
        });

        self.buffers.insert(
            id,
            GpuBuffer {
                vertices: vertex_buffer,
                indices,
                layout,
                topology,
                vertex_count,
            },
        );
        id
    }

    fn destroy_vertex_buffer(&mut self, buffer: BufferId) {
        match self.buffers.remove(&buffer) {
            Some(b) => {
                b.vertices.destroy();
                if let Some((indices, _)) = b.indices {
                    indices.destroy();
                }
            }
            None => log::warn!("destroying unknown vertex buffer {buffer:?}"),
        }
    }

    fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.next());
        self.textures.insert(id, None);
        id
    }

    fn write_texture(&mut self, texture: TextureId, image: &DecodedImage) -> Result<(), RenderError> {
        if !self.textures.contains_key(&texture) {
            log::warn!("writing unknown texture {texture:?}");
            return Ok(());
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if image.width > max || image.height > max {
            return Err(RenderError::TextureTooLarge {
                width: image.width,
                height: image.height,
                max,
            });
        }
        let uploaded = upload_texture(
            &self.device,
            &self.queue,
            &self.layouts,
            &self.sampler,
            image,
            "lumen texture",
        )
        .map_err(|err| RenderError::TextureUpload(err.to_string()))?;
        self.textures.insert(texture, Some(uploaded));
        Ok(())
    }

    fn submit(&mut self, plan: &FramePlan) -> Result<(), SurfaceErrorAction> {
        if !self.surface.has_area() {
            return Err(SurfaceErrorAction::SkipFrame);
        }

        // Everything that needs `&mut self` happens before the pass borrows.
        self.ensure_object_slots(plan.draws.len());
        if plan.depth_test {
            self.ensure_depth();
        }
        let mut keys = Vec::with_capacity(plan.draws.len());
        for draw in &plan.draws {
            let Some(buffer) = self.buffers.get(&draw.buffer) else {
                log::warn!("draw references unknown buffer {:?}", draw.buffer);
                keys.push(None);
                continue;
            };
            let key = PipelineKey {
                program: draw.program,
                layout: buffer.layout,
                topology: buffer.topology,
                depth_test: plan.depth_test,
            };
            keys.push(self.ensure_pipeline(key).then_some(key));
        }
        self.write_uniforms(plan);

        let frame = match self.surface.acquire() {
            Ok(frame) => frame,
            Err(err) => return Err(self.surface.recover(&self.device, err)),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lumen frame encoder"),
            });

        {
            let [r, g, b, a] = plan.clear_color.map(f64::from);
            let depth_stencil_attachment = plan
                .depth_test
                .then_some(self.depth.as_ref())
                .flatten()
                .map(|depth| wgpu::RenderPassDepthStencilAttachment {
                    view: &depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("lumen frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let stride = self.objects.stride;

            for (i, (draw, key)) in plan.draws.iter().zip(&keys).enumerate() {
                let Some(key) = key else { continue };
                if draw.vertex_count == 0 {
                    continue;
                }
                let (Some(Some(pipeline)), Some(buffer)) =
                    (self.pipelines.get(key), self.buffers.get(&draw.buffer))
                else {
                    continue;
                };

                let texture_group = draw
                    .texture
                    .and_then(|t| self.textures.get(&t))
                    .and_then(Option::as_ref)
                    .map_or(&self.placeholder.bind_group, |t| &t.bind_group);

                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.objects.bind_group, &[(i as u64 * stride) as u32]);
                rpass.set_bind_group(1, texture_group, &[]);
                rpass.set_vertex_buffer(0, buffer.vertices.slice(..));

                match &buffer.indices {
                    Some((_, 0)) => {}
                    Some((indices, count)) => {
                        rpass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..*count, 0, 0..1);
                    }
                    None => rpass.draw(0..buffer.vertex_count, 0..1),
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }
}
