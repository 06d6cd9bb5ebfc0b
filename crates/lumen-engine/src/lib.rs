//! Lumen engine crate.
//!
//! A minimal real-time rendering core: shader programs, vertex buffers and an
//! asynchronously loaded texture on a wgpu device, driven one frame per host
//! redraw with per-frame camera/model transforms and an FPS status.

pub mod core;
pub mod device;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod observe;
pub mod renderer;
pub mod resources;
pub mod shader;
pub mod texture;
pub mod time;
pub mod transform;
pub mod window;

pub use error::RenderError;
