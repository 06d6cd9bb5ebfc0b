//! Graphics resource manager.
//!
//! Thin typed layer over a [`GraphicsDevice`]: validates inputs, turns
//! compile failures into diagnostics and enforces the lifecycle rules of
//! buffers and textures.

mod manager;

pub use manager::{ResourceManager, ShaderProgram, Texture, VertexBuffer};
