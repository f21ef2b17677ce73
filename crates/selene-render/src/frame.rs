//! Per-frame matrix pipeline and uniform binding.
//!
//! The projection is rebuilt only when the viewport changes. View and model
//! are rebuilt every frame from fixed inputs, so two frames with the same
//! phase and frame count produce bit-identical uniforms.

use glam::{Mat4, Vec3};
use log::debug;
use selene_lighting::light_direction_for;
use thiserror::Error;

use crate::buffer::SphereAttributes;
use crate::shader::{ShaderProgram, UniformLocation};
use crate::shaders::names;
use crate::uniforms::UniformBlocks;

/// Fixed camera looking at the sphere from +Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraSettings {
    /// Distance of the eye from the origin along +Z.
    pub eye_distance: f32,
    /// Near clip plane distance.
    pub near: f32,
    /// Far clip plane distance.
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye_distance: 3.0,
            near: 2.0,
            far: 7.0,
        }
    }
}

/// Camera settings that cannot produce a usable projection.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum CameraError {
    #[error("camera values must be finite (eye {eye_distance}, near {near}, far {far})")]
    NonFinite { eye_distance: f32, near: f32, far: f32 },

    #[error("near clip plane must be positive, got {near}")]
    NearNotPositive { near: f32 },

    #[error("near clip plane {near} must be closer than far clip plane {far}")]
    NearNotBeforeFar { near: f32, far: f32 },
}

impl CameraSettings {
    pub fn eye(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.eye_distance)
    }

    /// Check that `0 < near < far` and every value is finite.
    pub fn validate(&self) -> Result<(), CameraError> {
        if !(self.eye_distance.is_finite() && self.near.is_finite() && self.far.is_finite()) {
            return Err(CameraError::NonFinite {
                eye_distance: self.eye_distance,
                near: self.near,
                far: self.far,
            });
        }
        if self.near <= 0.0 {
            return Err(CameraError::NearNotPositive { near: self.near });
        }
        if self.near >= self.far {
            return Err(CameraError::NearNotBeforeFar {
                near: self.near,
                far: self.far,
            });
        }
        Ok(())
    }
}

/// Right-handed perspective frustum mapping depth to `[0, 1]`.
///
/// `near` maps to depth 0 and `far` to depth 1; both are positive distances.
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;

    Mat4::from_cols_array(&[
        2.0 * near / width,
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 * near / height,
        0.0,
        0.0,
        (right + left) / width,
        (top + bottom) / height,
        far / depth,
        -1.0,
        0.0,
        0.0,
        near * far / depth,
        0.0,
    ])
}

/// Uniform and attribute locations the sphere draw binds every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphereBindings {
    pub mvp_matrix: UniformLocation,
    pub model_view_matrix: UniformLocation,
    pub light_direction: UniformLocation,
    pub viewer_position: UniformLocation,
    pub surface_texture: UniformLocation,
    pub surface_sampler: UniformLocation,
    pub attributes: SphereAttributes,
}

impl SphereBindings {
    /// Resolve every name once against a freshly linked program.
    pub fn resolve(program: &ShaderProgram) -> Self {
        let bindings = Self {
            mvp_matrix: program.uniform_location(names::MVP_MATRIX),
            model_view_matrix: program.uniform_location(names::MODEL_VIEW_MATRIX),
            light_direction: program.uniform_location(names::LIGHT_DIRECTION),
            viewer_position: program.uniform_location(names::VIEWER_POSITION),
            surface_texture: program.uniform_location(names::SURFACE_TEXTURE),
            surface_sampler: program.uniform_location(names::SURFACE_SAMPLER),
            attributes: SphereAttributes {
                position: program.attribute_location(names::POSITION),
                normal: program.attribute_location(names::NORMAL),
                texcoord: program.attribute_location(names::TEXCOORD),
            },
        };

        debug!(
            "Attribute locations for program {}: position={:?} normal={:?} texcoord={:?}",
            program.id().get(),
            bindings.attributes.position,
            bindings.attributes.normal,
            bindings.attributes.texcoord
        );
        for (name, location) in [
            (names::MVP_MATRIX, bindings.mvp_matrix),
            (names::MODEL_VIEW_MATRIX, bindings.model_view_matrix),
            (names::LIGHT_DIRECTION, bindings.light_direction),
            (names::VIEWER_POSITION, bindings.viewer_position),
            (names::SURFACE_TEXTURE, bindings.surface_texture),
            (names::SURFACE_SAMPLER, bindings.surface_sampler),
        ] {
            if !location.is_valid() {
                debug!("Uniform '{name}' is not used by program {}", program.id().get());
            }
        }

        bindings
    }
}

/// Matrices and lighting inputs computed for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    /// Phase snapshot the frame was built from.
    pub phase: f32,
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
    /// `projection * view * model`.
    pub mvp: Mat4,
    /// `view * model`.
    pub model_view: Mat4,
    /// Light direction in eye space.
    pub light_direction: Vec3,
    /// Eye position in eye space.
    pub viewer_position: Vec3,
}

impl FrameState {
    /// Write this frame's values into the program's uniform blocks.
    pub fn write_uniforms(&self, bindings: &SphereBindings, blocks: &mut UniformBlocks) {
        blocks.set_mat4(bindings.mvp_matrix, &self.mvp);
        blocks.set_mat4(bindings.model_view_matrix, &self.model_view);
        blocks.set_vec3(bindings.light_direction, self.light_direction);
        blocks.set_vec3(bindings.viewer_position, self.viewer_position);
    }
}

/// Owns the matrix pipeline across frames.
#[derive(Clone, Debug)]
pub struct FrameRenderer {
    camera: CameraSettings,
    rotation_degrees_per_frame: f32,
    projection: Mat4,
    viewport: (u32, u32),
    frames_drawn: u64,
}

impl FrameRenderer {
    pub fn new(camera: CameraSettings, rotation_degrees_per_frame: f32) -> Self {
        let mut renderer = Self {
            camera,
            rotation_degrees_per_frame,
            projection: Mat4::IDENTITY,
            viewport: (1, 1),
            frames_drawn: 0,
        };
        renderer.resize(1, 1);
        renderer
    }

    /// Recompute the projection for a new viewport. Zero sizes are clamped to 1.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        let aspect = width as f32 / height as f32;
        self.viewport = (width, height);
        self.projection = frustum(
            -aspect,
            aspect,
            -1.0,
            1.0,
            self.camera.near,
            self.camera.far,
        );
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.camera.eye(), Vec3::ZERO, Vec3::Y)
    }

    /// Rotation about +Y in degrees for the current frame, in `[0, 360)`.
    pub fn rotation_degrees(&self) -> f32 {
        let degrees = self.frames_drawn as f64 * f64::from(self.rotation_degrees_per_frame);
        if degrees.is_finite() {
            degrees.rem_euclid(360.0) as f32
        } else {
            0.0
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation_degrees().to_radians())
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Build the frame's matrices for the given phase snapshot.
    pub fn prepare(&self, phase: f32) -> FrameState {
        let view = self.view();
        let model = self.model();
        let model_view = view * model;

        FrameState {
            phase,
            projection: self.projection,
            view,
            model,
            mvp: self.projection * model_view,
            model_view,
            light_direction: view.transform_vector3(light_direction_for(phase)),
            viewer_position: view.transform_point3(self.camera.eye()),
        }
    }

    /// Count a frame as drawn, advancing the rotation.
    pub fn advance(&mut self) {
        self.frames_drawn += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    const EPS: f32 = 1e-5;

    fn renderer(width: u32, height: u32) -> FrameRenderer {
        let mut renderer = FrameRenderer::new(CameraSettings::default(), 0.0);
        renderer.resize(width, height);
        renderer
    }

    #[test]
    fn test_camera_clip_planes_are_validated() {
        assert!(CameraSettings::default().validate().is_ok());

        let inverted = CameraSettings {
            near: 7.0,
            far: 2.0,
            ..CameraSettings::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(CameraError::NearNotBeforeFar { near: 7.0, far: 2.0 })
        );

        let zero = CameraSettings {
            near: 0.0,
            far: 0.0,
            ..CameraSettings::default()
        };
        assert_eq!(zero.validate(), Err(CameraError::NearNotPositive { near: 0.0 }));

        let infinite = CameraSettings {
            far: f32::INFINITY,
            ..CameraSettings::default()
        };
        assert!(matches!(infinite.validate(), Err(CameraError::NonFinite { .. })));
    }

    #[test]
    fn test_frustum_maps_near_and_far_to_unit_depth() {
        let p = frustum(-1.5, 1.5, -1.0, 1.0, 2.0, 7.0);
        let near = p * Vec4::new(0.0, 0.0, -2.0, 1.0);
        let far = p * Vec4::new(0.0, 0.0, -7.0, 1.0);
        assert!((near.z / near.w).abs() < EPS);
        assert!((far.z / far.w - 1.0).abs() < EPS);
    }

    #[test]
    fn test_frustum_edges_map_to_clip_bounds() {
        let p = frustum(-2.0, 2.0, -1.0, 1.0, 2.0, 7.0);
        // A point on the right edge of the near plane.
        let edge = p * Vec4::new(2.0, 1.0, -2.0, 1.0);
        assert!((edge.x / edge.w - 1.0).abs() < EPS);
        assert!((edge.y / edge.w - 1.0).abs() < EPS);
    }

    #[test]
    fn test_projection_uses_aspect_ratio() {
        let wide = renderer(1600, 900);
        let square = renderer(512, 512);
        let aspect = 1600.0 / 900.0;
        assert!((wide.projection().x_axis.x - 2.0 * 2.0 / (2.0 * aspect)).abs() < EPS);
        assert!((square.projection().x_axis.x - 2.0).abs() < EPS);
        assert_eq!(wide.projection().y_axis.y, square.projection().y_axis.y);
    }

    #[test]
    fn test_resize_changes_only_projection() {
        let mut renderer = renderer(1920, 1080);
        let before = renderer.prepare(0.3);
        renderer.resize(800, 800);
        let after = renderer.prepare(0.3);

        assert_ne!(before.projection, after.projection);
        assert_eq!(before.view, after.view);
        assert_eq!(before.model, after.model);
        assert_eq!(before.model_view, after.model_view);
        assert_eq!(before.light_direction, after.light_direction);
    }

    #[test]
    fn test_zero_viewport_is_clamped() {
        let renderer = renderer(0, 0);
        assert_eq!(renderer.viewport(), (1, 1));
        assert!(renderer.projection().is_finite());
    }

    #[test]
    fn test_view_looks_down_negative_z_from_eye() {
        let renderer = renderer(100, 100);
        let origin = renderer.view().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 0.0, -3.0)).length() < EPS);
    }

    #[test]
    fn test_mvp_composition_order() {
        let mut renderer = FrameRenderer::new(CameraSettings::default(), 30.0);
        renderer.resize(640, 480);
        renderer.advance();
        let frame = renderer.prepare(0.0);
        assert!(frame.mvp.abs_diff_eq(frame.projection * frame.view * frame.model, 1e-6));
        assert_eq!(frame.model_view, frame.view * frame.model);
        assert_ne!(frame.model, Mat4::IDENTITY);
    }

    #[test]
    fn test_repeated_prepare_is_bit_identical() {
        let renderer = renderer(1280, 720);
        let a = renderer.prepare(0.42);
        let b = renderer.prepare(0.42);
        assert_eq!(a.mvp.to_cols_array().map(f32::to_bits), b.mvp.to_cols_array().map(f32::to_bits));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rotation_is_opt_in() {
        let mut still = renderer(10, 10);
        still.advance();
        still.advance();
        assert_eq!(still.model(), Mat4::IDENTITY);

        let mut spinning = FrameRenderer::new(CameraSettings::default(), 90.0);
        for _ in 0..5 {
            spinning.advance();
        }
        assert!((spinning.rotation_degrees() - 90.0).abs() < EPS);
    }

    #[test]
    fn test_light_direction_follows_phase() {
        let renderer = renderer(10, 10);
        let quarter = renderer.prepare(0.25);
        assert!((quarter.light_direction - Vec3::Z).length() < EPS);
        assert!(renderer.prepare(1.5).light_direction.x < -0.99);
        assert!(renderer.prepare(0.0).viewer_position.length() < EPS);
    }
}
