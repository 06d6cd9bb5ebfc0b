//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - the runtime owns a `HostClock` and passes its elapsed milliseconds to each frame
//! - the renderer feeds that value to a `FrameClock` to obtain deltas
//! - deltas go into an `FpsEstimator`, which yields a smoothed rate every N frames

mod fps;
mod frame_clock;

pub use fps::{fps_status, FpsEstimator, DEFAULT_FPS_WINDOW};
pub use frame_clock::{FrameClock, FrameTime, HostClock};
