use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use super::ctx::{FrameCtx, StartCtx};
use crate::window::RuntimeCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
///
/// Callbacks are serialized on the event-loop thread, so an app never sees
/// a resize or key event in the middle of a frame.
pub trait App {
    /// Called once, after the window and its GPU context exist.
    ///
    /// An error stops the runtime and is returned from `Runtime::run`.
    fn on_start(&mut self, ctx: &mut StartCtx<'_, '_>) -> anyhow::Result<()>;

    /// Window events other than resize and redraw (keyboard, focus, ...).
    fn on_window_event(&mut self, event: &WindowEvent, runtime: &mut RuntimeCtx) -> AppControl {
        let _ = (event, runtime);
        AppControl::Continue
    }

    /// Called after the surface has been reconfigured for `size`.
    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        let _ = size;
    }

    /// Called once per redraw. `Continue` schedules the next one.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
