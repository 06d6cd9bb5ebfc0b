use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::topology::{primitive_topology, strip_index_format};
use super::ProgramId;
use crate::geometry::{Topology, VertexLayout};
use crate::shader::{LinkedProgram, FRAGMENT_ENTRY, VERTEX_ENTRY};

/// `@group(0) @binding(0)`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct GlobalsUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

/// `@group(0) @binding(1)`, one slot per draw at a dynamic offset.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// x: 1.0 when a texture is bound
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, textured: bool) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            params: [if textured { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

pub(crate) const GLOBALS_SIZE: u64 = std::mem::size_of::<GlobalsUniform>() as u64;
pub(crate) const OBJECT_SIZE: u64 = std::mem::size_of::<ObjectUniform>() as u64;

/// Bind group layouts shared by every program.
pub(crate) struct BindLayouts {
    pub uniforms: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
    pub pipeline: wgpu::PipelineLayout,
}

impl BindLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen uniforms bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(GLOBALS_SIZE),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(OBJECT_SIZE),
                    },
                    count: None,
                },
            ],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lumen texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lumen pipeline layout"),
            bind_group_layouts: &[&uniforms, &texture],
            immediate_size: 0,
        });

        Self {
            uniforms,
            texture,
            pipeline,
        }
    }
}

/// Runs `build` inside a validation error scope.
///
/// Without a scope wgpu hands validation errors to the uncaptured-error
/// handler, which panics by default.
pub(crate) fn capture_validation<T>(
    device: &wgpu::Device,
    build: impl FnOnce() -> T,
) -> Result<T, wgpu::Error> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(err),
        None => Ok(value),
    }
}

/// Shader modules for one linked program.
pub(crate) struct ProgramModules {
    pub label: String,
    pub vertex: wgpu::ShaderModule,
    pub fragment: wgpu::ShaderModule,
}

impl ProgramModules {
    pub fn new(device: &wgpu::Device, program: &LinkedProgram) -> Result<Self, wgpu::Error> {
        let (vertex, fragment) = capture_validation(device, || {
            let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("lumen {} vs", program.label)),
                source: wgpu::ShaderSource::Wgsl(program.vertex_source.as_str().into()),
            });
            let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("lumen {} fs", program.label)),
                source: wgpu::ShaderSource::Wgsl(program.fragment_source.as_str().into()),
            });
            (vertex, fragment)
        })?;
        Ok(Self {
            label: program.label.clone(),
            vertex,
            fragment,
        })
    }
}

/// Everything a render pipeline depends on besides the surface format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) struct PipelineKey {
    pub program: ProgramId,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub depth_test: bool,
}

fn vertex_format(components: usize) -> wgpu::VertexFormat {
    match components {
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

pub(crate) fn create_pipeline(
    device: &wgpu::Device,
    layouts: &BindLayouts,
    modules: &ProgramModules,
    key: PipelineKey,
    color_format: wgpu::TextureFormat,
    depth_format: wgpu::TextureFormat,
) -> Result<wgpu::RenderPipeline, wgpu::Error> {
    let attributes: Vec<wgpu::VertexAttribute> = key
        .layout
        .attributes()
        .iter()
        .map(|a| wgpu::VertexAttribute {
            format: vertex_format(a.components),
            offset: (a.offset * std::mem::size_of::<f32>()) as u64,
            shader_location: a.location,
        })
        .collect();

    let buffers = [wgpu::VertexBufferLayout {
        array_stride: key.layout.stride_bytes(),
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &attributes,
    }];

    let depth_stencil = key.depth_test.then(|| wgpu::DepthStencilState {
        format: depth_format,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    log::debug!(
        "creating pipeline for '{}' ({:?}, {:?}, depth {})",
        modules.label,
        key.layout,
        key.topology,
        key.depth_test
    );

    let label = format!("lumen {} pipeline", modules.label);
    capture_validation(device, || {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&layouts.pipeline),

            vertex: wgpu::VertexState {
                module: &modules.vertex,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &modules.fragment,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: primitive_topology(key.topology),
                strip_index_format: strip_index_format(key.topology),
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_structs() {
        assert_eq!(GLOBALS_SIZE, 128);
        assert_eq!(OBJECT_SIZE, 80);
        assert_eq!(GLOBALS_SIZE, u64::from(crate::shader::GLOBALS_BYTES));
        assert_eq!(OBJECT_SIZE, u64::from(crate::shader::OBJECT_BYTES));
    }

    #[test]
    fn object_uniform_flags_texturing() {
        assert_eq!(ObjectUniform::new(Mat4::IDENTITY, true).params[0], 1.0);
        assert_eq!(ObjectUniform::new(Mat4::IDENTITY, false).params[0], 0.0);
        assert_eq!(ObjectUniform::new(Mat4::IDENTITY, false).model[3][3], 1.0);
    }
}
