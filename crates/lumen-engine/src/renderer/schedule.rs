use super::driver::Renderer;
use crate::core::AppControl;
use crate::device::GraphicsDevice;
use crate::observe::StatusSink;

/// Drives `renderer` with host timestamps until they run out or it asks to stop.
///
/// The same loop the window runtime runs, minus the window: each item of
/// `ticks` is one frame signal carrying elapsed milliseconds. Returns the
/// number of frames rendered and the final control value.
pub fn run_scheduled<D, S, I>(
    renderer: &mut Renderer<S>,
    device: &mut D,
    ticks: I,
) -> (u64, AppControl)
where
    D: GraphicsDevice + ?Sized,
    S: StatusSink,
    I: IntoIterator<Item = f64>,
{
    let mut frames = 0;
    for elapsed_ms in ticks {
        frames += 1;
        if renderer.on_frame(device, elapsed_ms) == AppControl::Exit {
            return (frames, AppControl::Exit);
        }
    }
    (frames, AppControl::Continue)
}
