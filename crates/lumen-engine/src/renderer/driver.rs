use std::collections::HashSet;

use winit::dpi::PhysicalSize;

use super::config::{ProgramSlot, ProgramSet, RendererConfig};
use crate::core::AppControl;
use crate::device::{DrawCall, FramePlan, GraphicsDevice};
use crate::error::RenderError;
use crate::geometry::{Geometry, GeometryKind, VertexLayout};
use crate::observe::{LogSink, StatusSink};
use crate::resources::{ResourceManager, ShaderProgram, Texture, VertexBuffer};
use crate::shader::CompileDiagnostic;
use crate::texture::{DecodeTicket, FileImageSource, LoadPhase, TextureLoader};
use crate::time::{fps_status, FpsEstimator, FrameClock, FrameTime};
use crate::transform::TransformPipeline;

type CompileResult = Result<ShaderProgram, CompileDiagnostic>;

struct Programs {
    flat: CompileResult,
    lit: CompileResult,
}

impl Programs {
    fn get(&self, slot: ProgramSlot) -> &CompileResult {
        match slot {
            ProgramSlot::Flat => &self.flat,
            ProgramSlot::Lit => &self.lit,
        }
    }
}

/// State that only exists once [`Renderer::setup`] succeeded.
struct Scene {
    programs: Programs,
    buffer: VertexBuffer,
    shape: GeometryKind,
    texture: Texture,
}

/// Drives one frame per host tick.
///
/// Owns every piece of per-frame state: clock, FPS estimator, transforms,
/// the active vertex buffer, the texture and its loader. The device is
/// borrowed for each call, never stored.
///
/// Frame order:
/// 1. apply the pending shape switch and a finished texture decode
/// 2. advance the clock and publish FPS every `fps_window` frames
/// 3. recompute camera and model matrices
/// 4. build the frame plan (clear, uniforms, one draw per object) and submit
pub struct Renderer<S: StatusSink = LogSink> {
    config: RendererConfig,
    sink: S,

    clock: FrameClock,
    fps: FpsEstimator,
    transforms: TransformPipeline,

    loader: TextureLoader,
    pending_shape: Option<GeometryKind>,
    scene: Option<Scene>,

    last_frame: Option<FrameTime>,
    warned: HashSet<(ProgramSlot, VertexLayout)>,
}

impl Renderer<LogSink> {
    pub fn new(config: RendererConfig) -> Self {
        Self::with_sink(config, LogSink)
    }
}

impl<S: StatusSink> Renderer<S> {
    pub fn with_sink(config: RendererConfig, sink: S) -> Self {
        let fps = FpsEstimator::new(config.fps_window);
        let transforms = TransformPipeline::new(config.projection, config.objects.clone());
        Self {
            config,
            sink,
            clock: FrameClock::new(),
            fps,
            transforms,
            loader: TextureLoader::new(),
            pending_shape: None,
            scene: None,
            last_frame: None,
            warned: HashSet::new(),
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn transforms(&self) -> &TransformPipeline {
        &self.transforms
    }

    /// `true` between a successful `setup` and drop.
    pub fn is_ready(&self) -> bool {
        self.scene.is_some()
    }

    /// Shape currently uploaded, if set up.
    pub fn active_shape(&self) -> Option<GeometryKind> {
        self.scene.as_ref().map(|s| s.shape)
    }

    pub fn active_buffer(&self) -> Option<&VertexBuffer> {
        self.scene.as_ref().map(|s| &s.buffer)
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.scene.as_ref().map(|s| &s.texture)
    }

    pub fn texture_phase(&self) -> LoadPhase {
        self.loader.phase()
    }

    /// Timing of the most recent frame.
    pub fn last_frame(&self) -> Option<FrameTime> {
        self.last_frame
    }

    /// Compile diagnostics produced at setup.
    pub fn diagnostics(&self) -> impl Iterator<Item = &CompileDiagnostic> {
        self.scene
            .iter()
            .flat_map(|s| [&s.programs.flat, &s.programs.lit])
            .filter_map(|p| p.as_ref().err())
    }

    /// One-time startup: programs, initial geometry, texture, projection.
    ///
    /// Shader failures are not errors here; they leave the affected program
    /// as a diagnostic and the renderer keeps running without those draws.
    pub fn setup<D>(&mut self, device: &mut D) -> Result<(), RenderError>
    where
        D: GraphicsDevice + ?Sized,
    {
        if self.scene.is_some() {
            log::warn!("renderer already set up");
            return Ok(());
        }

        let size = device.surface_size();
        if size.width == 0 || size.height == 0 {
            return Err(RenderError::ResourceUnavailable(format!(
                "drawing surface is {}x{}",
                size.width, size.height
            )));
        }

        let ProgramSet { flat, lit } = self.config.programs;
        let mut resources = ResourceManager::new(device);
        let programs = Programs {
            flat: resources.compile_program(flat.label, flat.vertex, flat.fragment, &mut self.sink),
            lit: resources.compile_program(lit.label, lit.vertex, lit.fragment, &mut self.sink),
        };

        let shape = self.config.initial_shape;
        let buffer = resources.upload_geometry(&Geometry::build(shape))?;
        let texture = resources.create_texture();

        if let Some(path) = self.config.texture_path.clone() {
            log::info!("loading texture {}", path.display());
            self.loader.spawn(FileImageSource, path);
        }

        self.transforms.set_aspect(aspect(size));
        self.scene = Some(Scene {
            programs,
            buffer,
            shape,
            texture,
        });

        log::info!("renderer ready: {shape}, {}x{}", size.width, size.height);
        Ok(())
    }

    /// Starts a texture load fed by the caller instead of the configured file.
    ///
    /// `None` if a load already started.
    pub fn begin_texture_load(&mut self) -> Option<DecodeTicket> {
        self.loader.begin()
    }

    /// Queues a shape switch by catalog key; applied at the start of the next frame.
    ///
    /// Unknown keys are ignored.
    pub fn on_shape_select(&mut self, name: &str) {
        match name.parse::<GeometryKind>() {
            Ok(kind) => self.set_shape(kind),
            Err(err) => log::debug!("{err}; ignored"),
        }
    }

    pub fn set_shape(&mut self, kind: GeometryKind) {
        log::debug!("shape switch to {kind} queued");
        self.pending_shape = Some(kind);
    }

    /// Recomputes the projection for the new drawable size.
    ///
    /// No-op before setup and while the surface has no area.
    pub fn on_resize(&mut self, size: PhysicalSize<u32>) {
        if self.scene.is_none() || size.width == 0 || size.height == 0 {
            return;
        }
        self.transforms.set_aspect(aspect(size));
    }

    /// Renders one frame for the host timestamp `elapsed_ms`.
    ///
    /// Returns `Exit` only when the device reports an unrecoverable surface
    /// error; everything else degrades to a frame with fewer draws.
    pub fn on_frame<D>(&mut self, device: &mut D, elapsed_ms: f64) -> AppControl
    where
        D: GraphicsDevice + ?Sized,
    {
        if self.scene.is_none() {
            log::trace!("frame before setup; skipped");
            return AppControl::Continue;
        }

        self.apply_pending(device);

        let ft = self.clock.tick(elapsed_ms);
        if let Some(fps) = self.fps.record(ft.delta_ms) {
            self.sink.publish_status(&fps_status(fps));
        }
        self.last_frame = Some(ft);

        self.transforms.update(elapsed_ms);
        let plan = self.build_plan();

        let submitted = device.submit(&plan);
        for line in device.take_diagnostics() {
            self.sink.publish_diagnostic(&line);
        }

        match submitted {
            Ok(()) => AppControl::Continue,
            Err(action) => {
                if plan.projection.is_some() {
                    self.transforms.invalidate_projection();
                }
                if action.is_fatal() {
                    log::error!("unrecoverable surface error; stopping");
                    AppControl::Exit
                } else {
                    AppControl::Continue
                }
            }
        }
    }

    // ── frame steps ──────────────────────────────────────────────────────────

    fn apply_pending<D>(&mut self, device: &mut D)
    where
        D: GraphicsDevice + ?Sized,
    {
        let Some(scene) = self.scene.as_mut() else { return };
        let mut resources = ResourceManager::new(device);

        if let Some(kind) = self.pending_shape.take() {
            match resources.upload_geometry(&Geometry::build(kind)) {
                Ok(buffer) => {
                    let old = std::mem::replace(&mut scene.buffer, buffer);
                    resources.release_buffer(old);
                    scene.shape = kind;
                    log::info!("shape switched to {kind}");
                }
                Err(err) => log::error!("failed to upload {kind}: {err}"),
            }
        }

        if let Some(image) = self.loader.poll() {
            if let Err(err) = resources.complete_texture_upload(&mut scene.texture, &image) {
                log::warn!("texture upload refused: {err}; drawing untextured");
            }
        }
    }

    fn build_plan(&mut self) -> FramePlan {
        let mut plan = FramePlan::clear(
            self.config.clear_color,
            self.config.depth_test,
            self.transforms.camera(),
        );
        plan.projection = self.transforms.take_stale_projection();

        let Some(scene) = self.scene.as_ref() else {
            return plan;
        };

        let layout = scene.buffer.layout();
        let slot = ProgramSet::slot(layout);
        let program = match scene.programs.get(slot) {
            Ok(program) if program.accepts(layout) => program,
            Ok(program) => {
                if self.warned.insert((slot, layout)) {
                    log::warn!(
                        "program '{}' needs inputs {:?} that {layout:?} does not provide; not drawing",
                        program.label,
                        program.vertex_inputs
                    );
                }
                return plan;
            }
            // Already reported at setup.
            Err(_) => return plan,
        };

        let texture = scene.texture.is_ready().then(|| scene.texture.id());
        plan.draws = self
            .transforms
            .models()
            .iter()
            .map(|model| DrawCall {
                program: program.id,
                buffer: scene.buffer.id(),
                layout,
                topology: scene.buffer.topology(),
                vertex_count: scene.buffer.vertex_count(),
                model: *model,
                texture,
            })
            .collect();

        plan
    }
}

fn aspect(size: PhysicalSize<u32>) -> f32 {
    size.width as f32 / size.height as f32
}
