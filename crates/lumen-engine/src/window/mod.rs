//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single window, binds a [`Gpu`](crate::device::Gpu)
//! to it and acts as the host scheduler for the app's frames.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
