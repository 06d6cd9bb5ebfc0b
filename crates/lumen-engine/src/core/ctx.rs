use winit::window::Window;

use crate::device::Gpu;
use crate::window::RuntimeCtx;

/// Context for [`App::on_start`](super::App::on_start).
pub struct StartCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    /// Milliseconds since the runtime started; never decreases.
    pub elapsed_ms: f64,
    /// Redraws delivered so far, starting at 0.
    pub frame_index: u64,
    pub runtime: &'a mut RuntimeCtx,
}
