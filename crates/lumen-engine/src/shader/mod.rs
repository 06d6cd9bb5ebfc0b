//! WGSL programs and their compile/link checks.
//!
//! Stages are validated with naga before any GPU object exists, so a broken
//! shader becomes a diagnostic instead of a device error.

mod compile;

pub use compile::{
    compile_stage, link_program, BindingKind, CompileDiagnostic, LinkedProgram, ShaderStage,
    ENGINE_BINDINGS, FRAGMENT_ENTRY, GLOBALS_BYTES, OBJECT_BYTES, VERTEX_ENTRY,
};

/// Source pair for a built-in program.
#[derive(Debug, Copy, Clone)]
pub struct ProgramSource {
    pub label: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
}

/// Position-only program; colours fragments from object-space position.
pub const FLAT: ProgramSource = ProgramSource {
    label: "flat",
    vertex: include_str!("wgsl/flat.vert.wgsl"),
    fragment: include_str!("wgsl/flat.frag.wgsl"),
};

/// Position + normal + UV program with one directional light and an optional texture.
pub const LIT: ProgramSource = ProgramSource {
    label: "lit",
    vertex: include_str!("wgsl/lit.vert.wgsl"),
    fragment: include_str!("wgsl/lit.frag.wgsl"),
};
