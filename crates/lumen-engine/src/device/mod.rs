//! Graphics device layer.
//!
//! The renderer talks to a [`GraphicsDevice`]: it creates programs, vertex
//! buffers and textures through it and hands it one [`FramePlan`] per frame.
//! Two implementations exist:
//! - [`Gpu`]: wgpu-backed, bound to a window surface
//! - [`HeadlessDevice`]: records everything in memory, for tests and CI
//!
//! Everything wgpu-specific (pipeline layouts, uniform packing, topology
//! emulation) stays below this trait.

mod error;
mod gpu;
mod headless;
mod init;
mod pipeline;
mod surface;
mod topology;

pub use error::SurfaceErrorAction;
pub use gpu::Gpu;
pub use headless::{HeadlessDevice, RecordedBuffer, HEADLESS_MAX_TEXTURE_SIDE};
pub use init::GpuInit;
pub use topology::{expand_indices, primitive_topology, strip_index_format};

use glam::Mat4;
use winit::dpi::PhysicalSize;

use crate::error::RenderError;
use crate::geometry::{Topology, VertexLayout};
use crate::shader::LinkedProgram;
use crate::texture::DecodedImage;

/// Handle to a program created on a device.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProgramId(pub(crate) u32);

/// Handle to a device-resident vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferId(pub(crate) u32);

/// Handle to a device-resident texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TextureId(pub(crate) u32);

/// One draw of one object.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub buffer: BufferId,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub vertex_count: u32,
    pub model: Mat4,
    /// Bound only once the texture is ready.
    pub texture: Option<TextureId>,
}

/// Everything the device needs to produce one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub clear_color: [f32; 4],
    /// Clear and test against a depth attachment.
    pub depth_test: bool,
    /// Present only when the projection changed since the last upload.
    pub projection: Option<Mat4>,
    pub camera: Mat4,
    pub draws: Vec<DrawCall>,
}

impl FramePlan {
    /// A plan that only clears.
    pub fn clear(clear_color: [f32; 4], depth_test: bool, camera: Mat4) -> Self {
        Self {
            clear_color,
            depth_test,
            projection: None,
            camera,
            draws: Vec::new(),
        }
    }
}

/// Device operations the engine relies on.
///
/// Sources are validated and vertex data checked before they reach the
/// device. What can still fail is what only the device knows: its limits and
/// its own shader and pipeline validation. Those failures come back as values
/// and never abort the frame loop.
pub trait GraphicsDevice {
    /// Drawable size in physical pixels; zero while minimized.
    fn surface_size(&self) -> PhysicalSize<u32>;

    /// Reconfigures the drawable after a host resize.
    fn resize(&mut self, size: PhysicalSize<u32>);

    /// `Err` if the device rejects the shader modules.
    fn create_program(&mut self, program: &LinkedProgram) -> Result<ProgramId, RenderError>;

    /// Uploads interleaved vertices once; the buffer is immutable afterwards.
    fn create_vertex_buffer(
        &mut self,
        vertices: &[f32],
        layout: VertexLayout,
        topology: Topology,
    ) -> BufferId;

    fn destroy_vertex_buffer(&mut self, buffer: BufferId);

    /// Creates an empty texture; sampling it before [`write_texture`](Self::write_texture)
    /// is never requested.
    fn create_texture(&mut self) -> TextureId;

    /// `Err` if the image exceeds the device's texture limits; the texture
    /// keeps its previous contents.
    fn write_texture(&mut self, texture: TextureId, image: &DecodedImage) -> Result<(), RenderError>;

    /// Clears, uploads uniforms and records every draw in `plan`, then presents.
    ///
    /// A draw whose pipeline the device cannot build is dropped and reported
    /// through [`take_diagnostics`](Self::take_diagnostics).
    fn submit(&mut self, plan: &FramePlan) -> Result<(), SurfaceErrorAction>;

    /// Diagnostics raised since the last call, oldest first.
    fn take_diagnostics(&mut self) -> Vec<String>;
}
