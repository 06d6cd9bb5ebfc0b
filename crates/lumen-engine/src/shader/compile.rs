use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{
    AddressSpace, Binding, GlobalVariable, Handle, ImageClass, ImageDimension, Interpolation,
    Module, ScalarKind, Type, TypeInner,
};

use crate::error::RenderError;

/// Entry point the vertex stage must export.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Entry point the fragment stage must export.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Bytes bound at `@group(0) @binding(0)`: projection + view.
pub const GLOBALS_BYTES: u32 = 128;
/// Bytes bound per draw at `@group(0) @binding(1)`: model + params.
pub const OBJECT_BYTES: u32 = 80;

/// What the engine's pipeline layout puts at a binding.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BindingKind {
    /// `var<uniform>` no larger than `max_bytes`; visible to both stages.
    Uniform { max_bytes: u32 },
    /// `texture_2d<f32>`; fragment stage only.
    Texture2d,
    /// Filtering `sampler`; fragment stage only.
    Sampler,
}

/// `(group, binding, kind)` triples the engine's pipeline layout provides.
pub const ENGINE_BINDINGS: [(u32, u32, BindingKind); 4] = [
    (0, 0, BindingKind::Uniform { max_bytes: GLOBALS_BYTES }),
    (0, 1, BindingKind::Uniform { max_bytes: OBJECT_BYTES }),
    (1, 0, BindingKind::Texture2d),
    (1, 1, BindingKind::Sampler),
];

fn engine_binding(group: u32, binding: u32) -> Option<BindingKind> {
    ENGINE_BINDINGS
        .iter()
        .find(|(g, b, _)| *g == group && *b == binding)
        .map(|(_, _, kind)| *kind)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn entry(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_ENTRY,
            ShaderStage::Fragment => FRAGMENT_ENTRY,
        }
    }

    fn naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// A validated, linked vertex + fragment pair, ready for pipeline creation.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    pub label: String,
    pub vertex_source: String,
    pub fragment_source: String,
    /// Vertex input locations `vs_main` reads, ascending.
    pub vertex_inputs: Vec<u32>,
}

/// A program that failed to compile or link.
#[derive(Debug, Clone)]
pub struct CompileDiagnostic {
    pub label: String,
    pub error: RenderError,
}

impl std::fmt::Display for CompileDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.label, self.error)
    }
}

/// Parses and validates one WGSL stage.
pub fn compile_stage(stage: ShaderStage, source: &str) -> Result<Module, RenderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| RenderError::ShaderCompile {
        stage,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::default())
        .validate(&module)
        .map_err(|e| RenderError::ShaderCompile {
            stage,
            message: error_chain(&e),
        })?;

    Ok(module)
}

/// Compiles both stages and checks that they fit together and fit the engine's layout.
pub fn link_program(
    label: &str,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<LinkedProgram, CompileDiagnostic> {
    let fail = |error| CompileDiagnostic {
        label: label.to_owned(),
        error,
    };

    let vertex = compile_stage(ShaderStage::Vertex, vertex_source).map_err(fail)?;
    let fragment = compile_stage(ShaderStage::Fragment, fragment_source).map_err(fail)?;

    let interface = link(&vertex, &fragment).map_err(|message| fail(RenderError::ProgramLink { message }))?;

    Ok(LinkedProgram {
        label: label.to_owned(),
        vertex_source: vertex_source.to_owned(),
        fragment_source: fragment_source.to_owned(),
        vertex_inputs: interface,
    })
}

// ── link checks ─────────────────────────────────────────────────────────────

/// A `@location` on a stage interface.
struct Slot<'m> {
    location: u32,
    inner: &'m TypeInner,
    interpolation: Option<Interpolation>,
}

fn link(vertex: &Module, fragment: &Module) -> Result<Vec<u32>, String> {
    let vs = entry_point(vertex, ShaderStage::Vertex)?;
    let fs = entry_point(fragment, ShaderStage::Fragment)?;

    check_bindings(vertex, ShaderStage::Vertex)?;
    check_bindings(fragment, ShaderStage::Fragment)?;

    let mut vertex_inputs = Vec::new();
    for arg in &vs.function.arguments {
        collect_locations(vertex, arg.ty, arg.binding.as_ref(), &mut vertex_inputs);
    }
    // Every vertex attribute the engine supplies is f32.
    for slot in &vertex_inputs {
        if !is_f32(slot.inner) {
            return Err(format!(
                "vertex input @location({}) must be f32-based, found {:?}",
                slot.location, slot.inner
            ));
        }
    }

    let mut outputs = Vec::new();
    if let Some(result) = &vs.function.result {
        collect_locations(vertex, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = Vec::new();
    for arg in &fs.function.arguments {
        collect_locations(fragment, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    for input in &inputs {
        let Some(output) = outputs.iter().find(|o| o.location == input.location) else {
            return Err(format!(
                "fragment input @location({}) is not written by `{VERTEX_ENTRY}`",
                input.location
            ));
        };
        if output.inner != input.inner {
            return Err(format!(
                "@location({}) is {:?} in `{VERTEX_ENTRY}` but {:?} in `{FRAGMENT_ENTRY}`",
                input.location, output.inner, input.inner
            ));
        }
        if output.interpolation != input.interpolation {
            return Err(format!(
                "@location({}) is interpolated {:?} in `{VERTEX_ENTRY}` but {:?} in `{FRAGMENT_ENTRY}`",
                input.location, output.interpolation, input.interpolation
            ));
        }
    }

    let mut targets = Vec::new();
    if let Some(result) = &fs.function.result {
        collect_locations(fragment, result.ty, result.binding.as_ref(), &mut targets);
    }
    match targets.iter().find(|t| t.location == 0) {
        Some(target) if is_float(target.inner) => {}
        Some(target) => {
            return Err(format!(
                "colour output @location(0) must be floating point, found {:?}",
                target.inner
            ));
        }
        None => return Err(format!("`{FRAGMENT_ENTRY}` does not write @location(0)")),
    }

    let mut locations: Vec<u32> = vertex_inputs.iter().map(|s| s.location).collect();
    locations.sort_unstable();
    locations.dedup();

    Ok(locations)
}

fn entry_point(module: &Module, stage: ShaderStage) -> Result<&naga::EntryPoint, String> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage.naga() && ep.name == stage.entry())
        .ok_or_else(|| format!("{stage} stage has no `{}` entry point", stage.entry()))
}

fn check_bindings(module: &Module, stage: ShaderStage) -> Result<(), String> {
    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else { continue };
        let at = format!("{stage} stage @group({}) @binding({})", rb.group, rb.binding);

        let Some(kind) = engine_binding(rb.group, rb.binding) else {
            return Err(format!("{at} is not provided by the engine"));
        };
        if stage == ShaderStage::Vertex && !matches!(kind, BindingKind::Uniform { .. }) {
            return Err(format!("{at} is only visible to the fragment stage"));
        }
        check_binding_type(module, var, kind).map_err(|expected| format!("{at} must be {expected}"))?;
    }
    Ok(())
}

/// `Err` carries a description of what the engine binds there.
fn check_binding_type(module: &Module, var: &GlobalVariable, kind: BindingKind) -> Result<(), String> {
    let inner = &module.types[var.ty].inner;
    match kind {
        BindingKind::Uniform { max_bytes } => {
            if var.space != AddressSpace::Uniform {
                return Err(format!("a var<uniform>, found {:?}", var.space));
            }
            let size = inner.size(module.to_ctx());
            if size > max_bytes {
                return Err(format!("at most {max_bytes} bytes, found {size}"));
            }
        }
        BindingKind::Texture2d => {
            let ok = matches!(
                inner,
                TypeInner::Image {
                    dim: ImageDimension::D2,
                    arrayed: false,
                    class: ImageClass::Sampled {
                        kind: ScalarKind::Float,
                        multi: false
                    },
                }
            );
            if !ok {
                return Err(format!("texture_2d<f32>, found {inner:?}"));
            }
        }
        BindingKind::Sampler => {
            if !matches!(inner, TypeInner::Sampler { comparison: false }) {
                return Err(format!("a filtering sampler, found {inner:?}"));
            }
        }
    }
    Ok(())
}

fn is_float(inner: &TypeInner) -> bool {
    match inner {
        TypeInner::Scalar(s) | TypeInner::Vector { scalar: s, .. } => s.kind == ScalarKind::Float,
        _ => false,
    }
}

fn is_f32(inner: &TypeInner) -> bool {
    match inner {
        TypeInner::Scalar(s) | TypeInner::Vector { scalar: s, .. } => {
            s.kind == ScalarKind::Float && s.width == 4
        }
        _ => false,
    }
}

/// `@location`s carried by an argument or result, looking through structs.
fn collect_locations<'m>(
    module: &'m Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<Slot<'m>>,
) {
    match binding {
        Some(Binding::Location {
            location,
            interpolation,
            ..
        }) => out.push(Slot {
            location: *location,
            inner: &module.types[ty].inner,
            interpolation: *interpolation,
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(Binding::Location {
                        location,
                        interpolation,
                        ..
                    }) = &member.binding
                    {
                        out.push(Slot {
                            location: *location,
                            inner: &module.types[member.ty].inner,
                            interpolation: *interpolation,
                        });
                    }
                }
            }
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::{FLAT, LIT};

    #[test]
    fn builtin_programs_link() {
        let flat = link_program(FLAT.label, FLAT.vertex, FLAT.fragment).unwrap();
        assert_eq!(flat.vertex_inputs, vec![0]);

        let lit = link_program(LIT.label, LIT.vertex, LIT.fragment).unwrap();
        assert_eq!(lit.vertex_inputs, vec![0, 1, 2]);
    }

    #[test]
    fn syntax_error_is_a_compile_diagnostic() {
        let diag = link_program("broken", "fn vs_main( {", FLAT.fragment).unwrap_err();
        assert_eq!(diag.label, "broken");
        assert!(matches!(
            diag.error,
            RenderError::ShaderCompile { stage: ShaderStage::Vertex, .. }
        ));
        assert!(diag.to_string().starts_with("[broken] vertex shader failed to compile"));
    }

    #[test]
    fn type_error_fails_validation() {
        let fs = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let diag = link_program("typed", FLAT.vertex, fs).unwrap_err();
        assert!(matches!(
            diag.error,
            RenderError::ShaderCompile { stage: ShaderStage::Fragment, .. }
        ));
    }

    #[test]
    fn missing_entry_point_fails_link() {
        let fs = "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let diag = link_program("entry", FLAT.vertex, fs).unwrap_err();
        let RenderError::ProgramLink { message } = diag.error else {
            panic!("expected link error, got {:?}", diag.error);
        };
        assert!(message.contains("fs_main"), "{message}");
    }

    #[test]
    fn unmatched_fragment_input_fails_link() {
        let fs = "@fragment fn fs_main(@location(3) x: vec3<f32>) -> @location(0) vec4<f32> {
            return vec4<f32>(x, 1.0);
        }";
        let diag = link_program("mismatch", FLAT.vertex, fs).unwrap_err();
        let RenderError::ProgramLink { message } = diag.error else {
            panic!("expected link error, got {:?}", diag.error);
        };
        assert!(message.contains("@location(3)"), "{message}");
    }

    #[test]
    fn foreign_binding_fails_link() {
        let fs = "@group(2) @binding(0) var<uniform> tint: vec4<f32>;
            @fragment fn fs_main() -> @location(0) vec4<f32> { return tint; }";
        let diag = link_program("binding", FLAT.vertex, fs).unwrap_err();
        assert!(matches!(diag.error, RenderError::ProgramLink { .. }));
    }

    fn link_message(vs: &str, fs: &str) -> String {
        match link_program("custom", vs, fs).unwrap_err().error {
            RenderError::ProgramLink { message } => message,
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn uniform_at_texture_binding_fails_link() {
        let fs = "@group(1) @binding(0) var<uniform> tint: vec4<f32>;
            @fragment fn fs_main() -> @location(0) vec4<f32> { return tint; }";
        let message = link_message(FLAT.vertex, fs);
        assert!(message.contains("texture_2d<f32>"), "{message}");
    }

    #[test]
    fn comparison_sampler_fails_link() {
        let fs = "@group(1) @binding(1) var samp: sampler_comparison;
            @fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let message = link_message(FLAT.vertex, fs);
        assert!(message.contains("filtering sampler"), "{message}");
    }

    #[test]
    fn oversized_uniform_fails_link() {
        let fs = "struct Big { m: array<vec4<f32>, 16> };
            @group(0) @binding(1) var<uniform> big: Big;
            @fragment fn fs_main() -> @location(0) vec4<f32> { return big.m[0]; }";
        let message = link_message(FLAT.vertex, fs);
        assert!(message.contains("at most 80 bytes"), "{message}");
    }

    #[test]
    fn texture_in_vertex_stage_fails_link() {
        let vs = "@group(1) @binding(0) var tex: texture_2d<f32>;
            @vertex fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
                let size = textureDimensions(tex);
                return vec4<f32>(p, f32(size.x));
            }";
        let fs = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let message = link_message(vs, fs);
        assert!(message.contains("only visible to the fragment stage"), "{message}");
    }

    #[test]
    fn integer_vertex_input_fails_link() {
        let vs = "@vertex fn vs_main(@location(0) p: vec3<i32>) -> @builtin(position) vec4<f32> {
                return vec4<f32>(vec3<f32>(p), 1.0);
            }";
        let fs = "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let message = link_message(vs, fs);
        assert!(message.contains("vertex input @location(0)"), "{message}");
    }

    #[test]
    fn interstage_type_mismatch_fails_link() {
        let fs = "@fragment fn fs_main(@location(0) color: vec2<f32>) -> @location(0) vec4<f32> {
                return vec4<f32>(color, 0.0, 1.0);
            }";
        let message = link_message(FLAT.vertex, fs);
        assert!(message.contains("@location(0) is"), "{message}");
    }

    #[test]
    fn integer_colour_output_fails_link() {
        let fs = "@fragment fn fs_main() -> @location(0) vec4<u32> { return vec4<u32>(1u); }";
        let message = link_message(FLAT.vertex, fs);
        assert!(message.contains("colour output"), "{message}");
    }

    #[test]
    fn engine_bindings_match_uniform_sizes() {
        assert_eq!(engine_binding(0, 0), Some(BindingKind::Uniform { max_bytes: GLOBALS_BYTES }));
        assert_eq!(engine_binding(0, 1), Some(BindingKind::Uniform { max_bytes: OBJECT_BYTES }));
        assert_eq!(engine_binding(1, 1), Some(BindingKind::Sampler));
        assert_eq!(engine_binding(2, 0), None);
    }
}
