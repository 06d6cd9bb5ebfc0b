use glam::Mat4;

use super::matrices::{
    compute_camera, compute_model, compute_projection, ObjectTransform, ProjectionConfig,
};

/// Owns the projection, camera and per-object model matrices.
///
/// The projection only changes on resize and is handed out for upload once
/// per change (`take_stale_projection`). Camera and models are recomputed by
/// `update` every frame.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    config: ProjectionConfig,
    objects: Vec<ObjectTransform>,

    aspect: Option<f32>,
    projection: Mat4,
    projection_stale: bool,

    camera: Mat4,
    models: Vec<Mat4>,
}

impl TransformPipeline {
    pub fn new(config: ProjectionConfig, objects: Vec<ObjectTransform>) -> Self {
        let models = vec![Mat4::IDENTITY; objects.len()];
        Self {
            config,
            objects,
            aspect: None,
            projection: Mat4::IDENTITY,
            projection_stale: false,
            camera: Mat4::IDENTITY,
            models,
        }
    }

    /// Recomputes the projection for a new viewport aspect ratio.
    ///
    /// Ignores non-finite or non-positive ratios (minimized windows).
    pub fn set_aspect(&mut self, aspect: f32) {
        if !(aspect.is_finite() && aspect > 0.0) {
            log::debug!("ignoring degenerate aspect ratio {aspect}");
            return;
        }
        if self.aspect == Some(aspect) {
            return;
        }
        self.aspect = Some(aspect);
        self.projection = compute_projection(aspect, &self.config);
        self.projection_stale = true;
    }

    /// `true` once a projection has been computed.
    pub fn has_projection(&self) -> bool {
        self.aspect.is_some()
    }

    /// Returns the projection if it changed since the last call.
    pub fn take_stale_projection(&mut self) -> Option<Mat4> {
        if self.projection_stale {
            self.projection_stale = false;
            Some(self.projection)
        } else {
            None
        }
    }

    /// Hands the current projection out again on the next
    /// [`take_stale_projection`](Self::take_stale_projection), e.g. after a
    /// frame that never reached the device.
    pub fn invalidate_projection(&mut self) {
        self.projection_stale = self.has_projection();
    }

    /// Recomputes the camera and every model matrix for `elapsed_ms`.
    pub fn update(&mut self, elapsed_ms: f64) {
        self.camera = compute_camera(elapsed_ms);
        for (model, object) in self.models.iter_mut().zip(&self.objects) {
            *model = compute_model(elapsed_ms, object.translation, object.rotation_axis);
        }
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn camera(&self) -> Mat4 {
        self.camera
    }

    pub fn models(&self) -> &[Mat4] {
        &self.models
    }
}
