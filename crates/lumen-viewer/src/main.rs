use std::path::PathBuf;

use anyhow::Result;
use glam::{vec3, Vec3};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use lumen_engine::core::{App, AppControl, FrameCtx, StartCtx};
use lumen_engine::device::GpuInit;
use lumen_engine::geometry::GeometryKind;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::observe::MemorySink;
use lumen_engine::renderer::{Renderer, RendererConfig};
use lumen_engine::transform::ObjectTransform;
use lumen_engine::window::{Runtime, RuntimeConfig, RuntimeCtx};

const TITLE: &str = "lumen viewer";

/// Keys 1-8 pick a shape, Escape quits. The latest FPS status goes in the title.
struct Viewer {
    renderer: Renderer<MemorySink>,
}

impl Viewer {
    fn key_pressed(&mut self, code: KeyCode) -> AppControl {
        let slot = match code {
            KeyCode::Escape => return AppControl::Exit,
            KeyCode::Digit1 => 0,
            KeyCode::Digit2 => 1,
            KeyCode::Digit3 => 2,
            KeyCode::Digit4 => 3,
            KeyCode::Digit5 => 4,
            KeyCode::Digit6 => 5,
            KeyCode::Digit7 => 6,
            KeyCode::Digit8 => 7,
            _ => return AppControl::Continue,
        };
        self.renderer.on_shape_select(GeometryKind::ALL[slot].name());
        AppControl::Continue
    }
}

impl App for Viewer {
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> Result<()> {
        log::info!("surface format {:?}", ctx.gpu.surface_format());
        self.renderer.setup(&mut *ctx.gpu)?;
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent, _runtime: &mut RuntimeCtx) -> AppControl {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.key_pressed(*code),
            _ => AppControl::Continue,
        }
    }

    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        self.renderer.on_resize(size);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let control = self.renderer.on_frame(&mut *ctx.gpu, ctx.elapsed_ms);

        let latest = self.renderer.sink_mut().statuses.drain(..).last();
        if let Some(status) = latest {
            ctx.runtime.set_title(format!("{TITLE} | {} | {status}", shape_label(&self.renderer)));
        }

        control
    }
}

fn shape_label(renderer: &Renderer<MemorySink>) -> &'static str {
    renderer.active_shape().map_or("-", GeometryKind::name)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let initial_shape = match std::env::var("LUMEN_SHAPE") {
        Ok(name) => name.parse().unwrap_or_else(|err| {
            log::warn!("{err}; starting with triangles");
            GeometryKind::Triangles
        }),
        Err(_) => GeometryKind::Triangles,
    };

    let config = RendererConfig {
        initial_shape,
        texture_path: std::env::args_os().nth(1).map(PathBuf::from),
        objects: vec![
            ObjectTransform {
                translation: vec3(-0.75, 0.0, 0.0),
                rotation_axis: Vec3::Y,
            },
            ObjectTransform {
                translation: vec3(0.75, 0.0, 0.0),
                rotation_axis: vec3(1.0, 1.0, 0.0),
            },
        ],
        ..RendererConfig::default()
    };

    let gpu_init = GpuInit {
        present_mode: if std::env::var_os("LUMEN_NO_VSYNC").is_some() {
            wgpu::PresentMode::AutoNoVsync
        } else {
            wgpu::PresentMode::Fifo
        },
        ..GpuInit::default()
    };

    let viewer = Viewer {
        renderer: Renderer::with_sink(config, MemorySink::new()),
    };

    Runtime::run(
        RuntimeConfig {
            title: TITLE.to_string(),
            ..RuntimeConfig::default()
        },
        gpu_init,
        viewer,
    )
}
