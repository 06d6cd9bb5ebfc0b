use std::f32::consts::TAU;

use glam::{Mat4, Vec3};

/// Perspective parameters.
///
/// `fov_degrees` is the only degree-valued quantity in the engine; it is
/// converted to radians inside [`compute_projection`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 90.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Placement of one drawn object.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ObjectTransform {
    pub translation: Vec3,
    pub rotation_axis: Vec3,
}

impl Default for ObjectTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_axis: Vec3::Z,
        }
    }
}

/// Periodic factor in `[0, 1]` shared by the camera dolly and every model spin.
#[inline]
pub fn varying_factor(elapsed_ms: f64) -> f32 {
    (((elapsed_ms / 1000.0).sin() + 1.0) / 2.0) as f32
}

/// Right-handed perspective projection for the given aspect ratio.
///
/// Landscape and square viewports use the configured angle vertically.
/// Portrait viewports keep it horizontally instead, so narrowing the window
/// never crops the sides of the scene.
pub fn compute_projection(aspect: f32, config: &ProjectionConfig) -> Mat4 {
    let fov = config.fov_degrees.to_radians();
    let fov_y = if aspect >= 1.0 {
        fov
    } else {
        2.0 * ((fov / 2.0).tan() / aspect).atan()
    };
    Mat4::perspective_rh(fov_y, aspect, config.near, config.far)
}

/// View matrix dollying along +Z between distance 2 and 4.
pub fn compute_camera(elapsed_ms: f64) -> Mat4 {
    let distance = 2.0 * (varying_factor(elapsed_ms) + 1.0);
    Mat4::look_at_rh(Vec3::new(0.0, 0.0, distance), Vec3::ZERO, Vec3::Y)
}

/// Spin about `axis` through the object's origin, then move it to `translation`.
///
/// A zero axis leaves the object unrotated.
pub fn compute_model(elapsed_ms: f64, translation: Vec3, axis: Vec3) -> Mat4 {
    let angle = varying_factor(elapsed_ms) * TAU;
    let rotation = axis
        .try_normalize()
        .map_or(Mat4::IDENTITY, |axis| Mat4::from_axis_angle(axis, angle));
    Mat4::from_translation(translation) * rotation
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;

    fn eye_distance(view: Mat4) -> f32 {
        view.inverse().w_axis.truncate().length()
    }

    #[test]
    fn varying_factor_bounds() {
        assert_relative_eq!(varying_factor(0.0), 0.5);
        assert_relative_eq!(varying_factor(500.0 * PI), 1.0);
        assert_relative_eq!(varying_factor(1500.0 * PI), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn camera_distance_at_trough_is_two() {
        let view = compute_camera(1500.0 * PI);
        assert_relative_eq!(eye_distance(view), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn camera_distance_at_peak_is_four() {
        let view = compute_camera(500.0 * PI);
        assert_relative_eq!(eye_distance(view), 4.0, epsilon = 1e-5);
    }

    #[test]
    fn camera_looks_at_origin() {
        let view = compute_camera(1234.0);
        let origin_in_view = view.transform_point3(Vec3::ZERO);
        assert_relative_eq!(origin_in_view.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(origin_in_view.y, 0.0, epsilon = 1e-6);
        assert!(origin_in_view.z < 0.0);
    }

    #[test]
    fn projection_horizontal_scale_halves_with_double_aspect() {
        let cfg = ProjectionConfig::default();
        let square = compute_projection(1.0, &cfg);
        let wide = compute_projection(2.0, &cfg);
        assert_relative_eq!(square.x_axis.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(wide.x_axis.x, 0.5, epsilon = 1e-6);
        assert_relative_eq!(square.y_axis.y, wide.y_axis.y);
    }

    #[test]
    fn portrait_keeps_horizontal_fov() {
        let cfg = ProjectionConfig::default();
        let tall = compute_projection(0.5, &cfg);
        // 90 degrees horizontally -> x scale of 1 whatever the aspect.
        assert_relative_eq!(tall.x_axis.x, 1.0, epsilon = 1e-5);
        assert!(tall.y_axis.y < 1.0);
    }

    #[test]
    fn model_translates_after_rotating() {
        let offset = Vec3::new(1.5, 0.0, 0.0);
        let model = compute_model(500.0 * PI, offset, Vec3::Z);
        // Full turn at the peak: the local origin lands on the offset.
        assert!(model.transform_point3(Vec3::ZERO).abs_diff_eq(offset, 1e-6));
        let p = model.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(2.5, 0.0, 0.0), 1e-5), "{p:?}");
    }

    #[test]
    fn model_half_turn_about_z() {
        let model = compute_model(0.0, Vec3::ZERO, Vec3::Z);
        // varying 0.5 -> angle pi
        let p = model.transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-5), "{p:?}");
    }

    #[test]
    fn zero_axis_means_no_rotation() {
        let model = compute_model(0.0, Vec3::Y, Vec3::ZERO);
        assert!(model.abs_diff_eq(Mat4::from_translation(Vec3::Y), 1e-6));
    }
}
