use thiserror::Error;

use crate::shader::ShaderStage;

/// Engine error taxonomy.
///
/// Only `ResourceUnavailable` is fatal: it aborts setup because there is no
/// degraded mode without a drawing surface. Shader and asset failures are
/// absorbed at the point of creation and never escape the frame loop.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// A stage source was rejected by the shader compiler.
    #[error("{stage} shader failed to compile: {message}")]
    ShaderCompile { stage: ShaderStage, message: String },

    /// Both stages compiled but do not form a usable program.
    #[error("program link failed: {message}")]
    ProgramLink { message: String },

    /// The context or surface required at startup is missing.
    #[error("required resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// An image could not be fetched or decoded.
    #[error("failed to load asset '{path}': {message}")]
    AssetLoad { path: String, message: String },

    /// A decoded image exceeds the device's 2D texture limit.
    #[error("texture {width}x{height} exceeds the device limit of {max} per side")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    /// The device refused a texture upload for a reason other than size.
    #[error("texture upload rejected: {0}")]
    TextureUpload(String),

    /// Vertex data does not match its declared layout.
    #[error("invalid geometry: {0}")]
    Geometry(String),
}
