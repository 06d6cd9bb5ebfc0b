use lumen_engine::core::AppControl;
use lumen_engine::device::{GraphicsDevice, HeadlessDevice};
use lumen_engine::geometry::{GeometryKind, Topology};
use lumen_engine::observe::MemorySink;
use lumen_engine::renderer::{run_scheduled, ProgramSet, Renderer, RendererConfig};
use lumen_engine::shader::{ProgramSource, FLAT};
use lumen_engine::texture::{DecodedImage, LoadPhase};
use lumen_engine::RenderError;
use winit::dpi::PhysicalSize;

fn headless_renderer(config: RendererConfig) -> (Renderer<MemorySink>, HeadlessDevice) {
    let mut device = HeadlessDevice::new(800, 600);
    let mut renderer = Renderer::with_sink(config, MemorySink::new());
    renderer.setup(&mut device).expect("setup");
    (renderer, device)
}

fn ticks(count: u32, step_ms: f64) -> impl Iterator<Item = f64> {
    (1..=count).map(move |i| f64::from(i) * step_ms)
}

#[test]
fn ten_frames_at_100ms_publish_fps_10_once() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());

    let (frames, control) = run_scheduled(&mut renderer, &mut device, ticks(10, 100.0));

    assert_eq!((frames, control), (10, AppControl::Continue));
    assert_eq!(renderer.sink().statuses, vec!["FPS: 10".to_string()]);
    assert_eq!(device.frames().len(), 10);
}

#[test]
fn fps_is_published_once_per_window() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());

    run_scheduled(&mut renderer, &mut device, ticks(25, 20.0));

    // 50 fps, windows complete at frames 10 and 20.
    assert_eq!(renderer.sink().statuses, vec!["FPS: 50", "FPS: 50"]);
}

#[test]
fn frames_with_no_elapsed_time_publish_nothing() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());

    run_scheduled(&mut renderer, &mut device, std::iter::repeat_n(0.0, 10));
    assert!(renderer.sink().statuses.is_empty());

    // The window reset anyway: the next ten real frames report normally.
    run_scheduled(&mut renderer, &mut device, ticks(10, 100.0));
    assert_eq!(renderer.sink().statuses, vec!["FPS: 10"]);
}

const BROKEN_VERTEX: &str = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return oops; }";

#[test]
fn broken_shader_draws_nothing_and_keeps_running() {
    let config = RendererConfig {
        programs: ProgramSet {
            flat: ProgramSource {
                label: "broken",
                vertex: BROKEN_VERTEX,
                fragment: FLAT.fragment,
            },
            ..ProgramSet::default()
        },
        ..RendererConfig::default()
    };
    let (mut renderer, mut device) = headless_renderer(config);

    assert_eq!(renderer.sink().diagnostics.len(), 1);
    assert!(renderer.sink().diagnostics[0].contains("broken"));
    assert_eq!(renderer.diagnostics().count(), 1);

    let (frames, control) = run_scheduled(&mut renderer, &mut device, ticks(10, 16.0));
    assert_eq!((frames, control), (10, AppControl::Continue));
    assert!(device.frames().iter().all(|f| f.draws.is_empty()));
    // The clock still runs.
    assert_eq!(renderer.sink().statuses.len(), 1);

    // The lit program is unaffected.
    renderer.set_shape(GeometryKind::Cube);
    renderer.on_frame(&mut device, 200.0);
    assert_eq!(device.last_frame().unwrap().draws.len(), 1);
}

#[test]
fn shape_switch_applies_next_frame_and_releases_old_buffer() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());
    renderer.on_frame(&mut device, 16.0);
    let old = device.last_frame().unwrap().draws[0].buffer;

    renderer.on_shape_select("line_loop");
    // Nothing changes until the next frame.
    assert_eq!(renderer.active_shape(), Some(GeometryKind::Triangles));
    assert_eq!(device.live_buffers(), 1);

    renderer.on_frame(&mut device, 32.0);
    let draw = &device.last_frame().unwrap().draws[0];
    assert_eq!(draw.topology, Topology::LineLoop);
    assert_eq!(draw.vertex_count, 4);
    assert_ne!(draw.buffer, old);
    assert_eq!(device.released_buffers(), &[old]);
    assert_eq!(device.live_buffers(), 1);
}

#[test]
fn only_the_last_queued_shape_is_uploaded() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());
    renderer.on_shape_select("points");
    renderer.on_shape_select("triangle_fan");
    renderer.on_frame(&mut device, 16.0);

    let draw = &device.last_frame().unwrap().draws[0];
    assert_eq!(draw.topology, Topology::TriangleFan);
    assert_eq!(draw.vertex_count, 282);
    assert_eq!(device.released_buffers().len(), 1);
}

#[test]
fn projection_is_uploaded_on_first_frame_and_after_resize_only() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());
    run_scheduled(&mut renderer, &mut device, ticks(3, 16.0));

    let uploads: Vec<bool> = device.frames().iter().map(|f| f.projection.is_some()).collect();
    assert_eq!(uploads, vec![true, false, false]);

    let size = PhysicalSize::new(400, 800);
    device.resize(size);
    renderer.on_resize(size);
    renderer.on_frame(&mut device, 64.0);
    renderer.on_frame(&mut device, 80.0);

    let frames = device.frames();
    assert!(frames[3].projection.is_some());
    assert!(frames[4].projection.is_none());
    assert_ne!(frames[3].projection, frames[0].projection);
}

#[test]
fn camera_changes_every_frame() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());
    run_scheduled(&mut renderer, &mut device, [100.0, 200.0]);

    let frames = device.frames();
    assert_ne!(frames[0].camera, frames[1].camera);
    assert_ne!(frames[0].draws[0].model, frames[1].draws[0].model);
}

#[test]
fn every_object_gets_a_draw() {
    use lumen_engine::transform::ObjectTransform;

    let config = RendererConfig {
        objects: vec![ObjectTransform::default(); 3],
        ..RendererConfig::default()
    };
    let (mut renderer, mut device) = headless_renderer(config);
    renderer.on_frame(&mut device, 16.0);

    let draws = &device.last_frame().unwrap().draws;
    assert_eq!(draws.len(), 3);
    assert!(draws.iter().all(|d| d.buffer == draws[0].buffer));
}

#[test]
fn texture_readiness_never_reverts() {
    let config = RendererConfig {
        initial_shape: GeometryKind::Cube,
        ..RendererConfig::default()
    };
    let (mut renderer, mut device) = headless_renderer(config);
    let ticket = renderer.begin_texture_load().unwrap();

    // The ticket stays open across frames; polling must not block.
    let mut seen = Vec::new();
    for elapsed in ticks(6, 16.0) {
        renderer.on_frame(&mut device, elapsed);
        seen.push(renderer.texture().unwrap().is_ready());
    }
    ticket.complete(Ok(DecodedImage::solid([9, 9, 9, 255])));
    for elapsed in [200.0, 216.0, 232.0] {
        renderer.on_frame(&mut device, elapsed);
        seen.push(renderer.texture().unwrap().is_ready());
    }

    let first_ready = seen.iter().position(|r| *r).unwrap();
    assert_eq!(first_ready, 6);
    assert!(seen[first_ready..].iter().all(|r| *r));
    assert_eq!(device.texture_writes(), 1);
    assert_eq!(renderer.texture_phase(), LoadPhase::Ready);
}

#[test]
fn failed_texture_load_keeps_drawing_untextured() {
    let config = RendererConfig {
        initial_shape: GeometryKind::Cube,
        ..RendererConfig::default()
    };
    let (mut renderer, mut device) = headless_renderer(config);

    renderer
        .begin_texture_load()
        .unwrap()
        .complete(Err(RenderError::AssetLoad {
            path: "missing.png".into(),
            message: "not found".into(),
        }));

    run_scheduled(&mut renderer, &mut device, ticks(3, 16.0));

    assert_eq!(renderer.texture_phase(), LoadPhase::Failed);
    assert!(!renderer.texture().unwrap().is_ready());
    assert!(device.frames().iter().all(|f| f.draws[0].texture.is_none()));
    assert_eq!(device.texture_writes(), 0);
}

#[test]
fn missing_texture_file_fails_without_stalling() {
    let config = RendererConfig {
        texture_path: Some("/no/such/dir/texture.png".into()),
        ..RendererConfig::default()
    };
    let (mut renderer, mut device) = headless_renderer(config);

    let mut elapsed = 0.0;
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while renderer.texture_phase() == LoadPhase::Loading {
        assert!(std::time::Instant::now() < deadline, "decode never finished");
        elapsed += 16.0;
        assert_eq!(renderer.on_frame(&mut device, elapsed), AppControl::Continue);
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    assert_eq!(renderer.texture_phase(), LoadPhase::Failed);
    assert!(!device.frames().is_empty());
}

#[test]
fn setup_fails_without_a_surface() {
    let mut device = HeadlessDevice::new(0, 0);
    let mut renderer = Renderer::with_sink(RendererConfig::default(), MemorySink::new());

    let err = renderer.setup(&mut device).unwrap_err();
    assert!(matches!(err, RenderError::ResourceUnavailable(_)));
    assert!(!renderer.is_ready());
    assert_eq!(device.program_count(), 0);
}

#[test]
fn every_catalog_shape_draws_with_its_own_topology() {
    let (mut renderer, mut device) = headless_renderer(RendererConfig::default());

    let mut elapsed = 0.0;
    for kind in GeometryKind::ALL {
        renderer.set_shape(kind);
        elapsed += 16.0;
        renderer.on_frame(&mut device, elapsed);

        let draw = &device.last_frame().unwrap().draws[0];
        let recorded = device.buffer(draw.buffer).unwrap();
        assert_eq!(draw.topology, recorded.topology, "{kind}");
        assert_eq!(
            recorded.vertices.len(),
            draw.vertex_count as usize * recorded.layout.stride(),
            "{kind}"
        );
    }
    assert_eq!(device.live_buffers(), 1);
}
