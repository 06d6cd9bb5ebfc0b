//! Transform pipeline.
//!
//! Conventions: 4x4 column-major matrices (`glam::Mat4`), right-handed,
//! +Y up, radians everywhere except `ProjectionConfig::fov_degrees`.

mod matrices;
mod pipeline;

pub use matrices::{
    compute_camera, compute_model, compute_projection, varying_factor, ObjectTransform,
    ProjectionConfig,
};
pub use pipeline::TransformPipeline;
