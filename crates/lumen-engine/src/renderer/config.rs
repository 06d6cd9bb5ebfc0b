use std::path::PathBuf;

use crate::geometry::{GeometryKind, VertexLayout};
use crate::shader::{ProgramSource, FLAT, LIT};
use crate::time::DEFAULT_FPS_WINDOW;
use crate::transform::{ObjectTransform, ProjectionConfig};

/// Programs the renderer compiles at setup.
#[derive(Debug, Copy, Clone)]
pub struct ProgramSet {
    /// Draws position-only geometry.
    pub flat: ProgramSource,
    /// Draws geometry that carries normals and UVs.
    pub lit: ProgramSource,
}

impl ProgramSet {
    pub(crate) fn slot(layout: VertexLayout) -> ProgramSlot {
        match layout {
            VertexLayout::Position => ProgramSlot::Flat,
            VertexLayout::PositionNormalUv => ProgramSlot::Lit,
        }
    }
}

impl Default for ProgramSet {
    fn default() -> Self {
        Self { flat: FLAT, lit: LIT }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub(crate) enum ProgramSlot {
    Flat,
    Lit,
}

/// Renderer options.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Linear RGBA.
    pub clear_color: [f32; 4],
    pub depth_test: bool,
    pub projection: ProjectionConfig,
    /// Frames per FPS sample.
    pub fps_window: u32,
    pub initial_shape: GeometryKind,
    /// One draw per entry, all sharing the active geometry.
    pub objects: Vec<ObjectTransform>,
    /// Image decoded in the background and bound once ready.
    pub texture_path: Option<PathBuf>,
    pub programs: ProgramSet,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [1.0, 0.0, 0.0, 1.0],
            depth_test: true,
            projection: ProjectionConfig::default(),
            fps_window: DEFAULT_FPS_WINDOW,
            initial_shape: GeometryKind::Triangles,
            objects: vec![ObjectTransform::default()],
            texture_path: None,
            programs: ProgramSet::default(),
        }
    }
}
