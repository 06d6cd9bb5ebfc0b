use std::collections::{HashMap, HashSet, VecDeque};

use winit::dpi::PhysicalSize;

use super::{
    BufferId, FramePlan, GraphicsDevice, ProgramId, SurfaceErrorAction, TextureId,
};
use crate::error::RenderError;
use crate::geometry::{Topology, VertexLayout};
use crate::shader::LinkedProgram;
use crate::texture::DecodedImage;

/// Vertex buffer as seen by [`HeadlessDevice`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBuffer {
    pub vertices: Vec<f32>,
    pub layout: VertexLayout,
    pub topology: Topology,
}

/// Largest texture side a [`HeadlessDevice`] accepts unless told otherwise;
/// the wgpu default limit.
pub const HEADLESS_MAX_TEXTURE_SIDE: u32 = 8192;

/// A device without a GPU.
///
/// Keeps every created object and every submitted [`FramePlan`] so callers
/// can inspect what would have been drawn. Surface errors, program
/// rejections and pipeline failures can be injected to exercise the
/// renderer's recovery paths.
#[derive(Debug)]
pub struct HeadlessDevice {
    size: PhysicalSize<u32>,
    next_id: u32,

    programs: HashMap<ProgramId, String>,
    buffers: HashMap<BufferId, RecordedBuffer>,
    released: Vec<BufferId>,
    textures: HashMap<TextureId, Option<DecodedImage>>,
    texture_writes: u32,
    max_texture_side: u32,

    rejected_labels: HashSet<String>,
    broken_pipelines: HashSet<ProgramId>,
    reported_pipelines: HashSet<ProgramId>,
    diagnostics: Vec<String>,

    frames: Vec<FramePlan>,
    pending_errors: VecDeque<SurfaceErrorAction>,
}

impl HeadlessDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: PhysicalSize::new(width, height),
            next_id: 0,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            released: Vec::new(),
            textures: HashMap::new(),
            texture_writes: 0,
            max_texture_side: HEADLESS_MAX_TEXTURE_SIDE,
            rejected_labels: HashSet::new(),
            broken_pipelines: HashSet::new(),
            reported_pipelines: HashSet::new(),
            diagnostics: Vec::new(),
            frames: Vec::new(),
            pending_errors: VecDeque::new(),
        }
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Lowers the texture side limit enforced by `write_texture`.
    pub fn with_max_texture_side(mut self, side: u32) -> Self {
        self.max_texture_side = side;
        self
    }

    /// Makes `create_program` reject every program named `label`.
    pub fn reject_program(&mut self, label: &str) {
        self.rejected_labels.insert(label.to_owned());
    }

    /// Makes every pipeline for `program` fail to build.
    pub fn break_pipelines(&mut self, program: ProgramId) {
        self.broken_pipelines.insert(program);
    }

    /// Makes the next `submit` fail with `action` instead of recording.
    pub fn fail_next_submit(&mut self, action: SurfaceErrorAction) {
        self.pending_errors.push_back(action);
    }

    pub fn frames(&self) -> &[FramePlan] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&FramePlan> {
        self.frames.last()
    }

    pub fn program_label(&self, id: ProgramId) -> Option<&str> {
        self.programs.get(&id).map(String::as_str)
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn buffer(&self, id: BufferId) -> Option<&RecordedBuffer> {
        self.buffers.get(&id)
    }

    /// Buffers created and not yet destroyed.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Buffers destroyed so far, in release order.
    pub fn released_buffers(&self) -> &[BufferId] {
        &self.released
    }

    pub fn texture_image(&self, id: TextureId) -> Option<&DecodedImage> {
        self.textures.get(&id).and_then(Option::as_ref)
    }

    /// Number of `write_texture` calls across all textures.
    pub fn texture_writes(&self) -> u32 {
        self.texture_writes
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn surface_size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }

    fn create_program(&mut self, program: &LinkedProgram) -> Result<ProgramId, RenderError> {
        if self.rejected_labels.contains(&program.label) {
            return Err(RenderError::ProgramLink {
                message: format!("device rejected shader modules for '{}'", program.label),
            });
        }
        let id = ProgramId(self.next());
        self.programs.insert(id, program.label.clone());
        Ok(id)
    }

    fn create_vertex_buffer(
        &mut self,
        vertices: &[f32],
        layout: VertexLayout,
        topology: Topology,
    ) -> BufferId {
        let id = BufferId(self.next());
        self.buffers.insert(
            id,
            RecordedBuffer {
                vertices: vertices.to_vec(),
                layout,
                topology,
            },
        );
        id
    }

    fn destroy_vertex_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            self.released.push(buffer);
        } else {
            log::warn!("destroying unknown vertex buffer {buffer:?}");
        }
    }

    fn create_texture(&mut self) -> TextureId {
        let id = TextureId(self.next());
        self.textures.insert(id, None);
        id
    }

    fn write_texture(&mut self, texture: TextureId, image: &DecodedImage) -> Result<(), RenderError> {
        let max = self.max_texture_side;
        if image.width > max || image.height > max {
            return Err(RenderError::TextureTooLarge {
                width: image.width,
                height: image.height,
                max,
            });
        }
        match self.textures.get_mut(&texture) {
            Some(slot) => {
                *slot = Some(image.clone());
                self.texture_writes += 1;
            }
            None => log::warn!("writing unknown texture {texture:?}"),
        }
        Ok(())
    }

    fn submit(&mut self, plan: &FramePlan) -> Result<(), SurfaceErrorAction> {
        if let Some(action) = self.pending_errors.pop_front() {
            return Err(action);
        }

        let mut recorded = plan.clone();
        recorded.draws.retain(|draw| {
            if !self.broken_pipelines.contains(&draw.program) {
                return true;
            }
            if self.reported_pipelines.insert(draw.program) {
                let label = self.programs.get(&draw.program).map_or("?", String::as_str);
                self.diagnostics.push(format!("[{label}] pipeline creation failed"));
            }
            false
        });
        self.frames.push(recorded);
        Ok(())
    }

    fn take_diagnostics(&mut self) -> Vec<String> {
        std::mem::take(&mut self.diagnostics)
    }
}
