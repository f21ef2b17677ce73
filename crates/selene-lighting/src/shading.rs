//! CPU reference of the sphere's per-pixel shading.
//!
//! The fragment shader evaluates the same expression; keeping a copy here
//! lets the lighting response be tested without a GPU.

use glam::{Vec3, Vec4};

/// Ambient floor on the lit side.
pub const AMBIENT_STRENGTH: f32 = 0.2;
/// Fraction of the ambient floor kept on the dark side.
pub const DARK_SIDE_AMBIENT: f32 = 0.7;
pub const SPECULAR_STRENGTH: f32 = 0.1;
pub const SHININESS: f32 = 32.0;

/// Individual lighting contributions for one surface point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadingTerms {
    /// `smoothstep(-1, 1, n·l)`: 0 fully dark, 1 fully lit.
    pub daylight: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

impl ShadingTerms {
    /// Scalar applied to the texel's RGB.
    pub fn total(&self) -> f32 {
        self.ambient + self.diffuse + self.specular
    }
}

/// Evaluate the lighting terms.
///
/// `normal` and `light_dir` are normalized here; `view_dir` is used as given,
/// matching the shader.
pub fn shading_terms(normal: Vec3, light_dir: Vec3, view_dir: Vec3) -> ShadingTerms {
    let n = normal.normalize_or_zero();
    let l = light_dir.normalize_or_zero();
    let d = n.dot(l);

    let daylight = smoothstep(-1.0, 1.0, d);
    let ambient = AMBIENT_STRENGTH * mix(DARK_SIDE_AMBIENT, 1.0, daylight);
    let diffuse = d.max(0.0).powi(2);
    let specular =
        SPECULAR_STRENGTH * view_dir.dot(reflect(-l, n)).max(0.0).powf(SHININESS) * daylight;

    ShadingTerms {
        daylight,
        ambient,
        diffuse,
        specular,
    }
}

/// Final fragment color for a texel sampled at this point.
pub fn shade(normal: Vec3, light_dir: Vec3, view_dir: Vec3, texel: Vec4) -> Vec4 {
    let scale = shading_terms(normal, light_dir, view_dir).total();
    (texel.truncate() * scale).extend(texel.w)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn reflect(incident: Vec3, normal: Vec3) -> Vec3 {
    incident - 2.0 * normal.dot(incident) * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_point_facing_light() {
        let terms = shading_terms(Vec3::X, Vec3::X, Vec3::X);
        assert!((terms.daylight - 1.0).abs() < EPS);
        assert!((terms.ambient - 0.2).abs() < EPS);
        assert!((terms.diffuse - 1.0).abs() < EPS);
        assert!((terms.specular - 0.1).abs() < EPS);
        assert!((terms.total() - 1.3).abs() < EPS);
    }

    #[test]
    fn test_terminator() {
        // Light grazes the surface; viewer looks straight down the normal.
        let terms = shading_terms(Vec3::Y, Vec3::X, Vec3::Y);
        assert!((terms.daylight - 0.5).abs() < EPS);
        assert!((terms.ambient - 0.17).abs() < EPS);
        assert_eq!(terms.diffuse, 0.0);
        assert!(terms.specular.abs() < EPS);
    }

    #[test]
    fn test_dark_side() {
        let terms = shading_terms(Vec3::NEG_X, Vec3::X, Vec3::NEG_X);
        assert_eq!(terms.daylight, 0.0);
        assert!((terms.ambient - 0.14).abs() < EPS);
        assert_eq!(terms.diffuse, 0.0);
        assert_eq!(terms.specular, 0.0);
    }

    #[test]
    fn test_unnormalized_inputs_are_normalized() {
        let a = shading_terms(Vec3::new(0.0, 3.0, 4.0), Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        let b = shading_terms(Vec3::new(0.0, 0.6, 0.8), Vec3::Z, Vec3::Z);
        assert!((a.total() - b.total()).abs() < EPS);
    }

    #[test]
    fn test_shade_scales_rgb_and_keeps_alpha() {
        let texel = Vec4::new(0.5, 0.25, 1.0, 0.4);
        let color = shade(Vec3::NEG_X, Vec3::X, Vec3::NEG_X, texel);
        assert!((color.x - 0.07).abs() < EPS);
        assert!((color.y - 0.035).abs() < EPS);
        assert!((color.z - 0.14).abs() < EPS);
        assert_eq!(color.w, 0.4);
    }

    #[test]
    fn test_brightness_falls_off_across_terminator() {
        let mut prev = f32::INFINITY;
        for i in 0..=20 {
            let angle = i as f32 / 20.0 * std::f32::consts::PI;
            let normal = Vec3::new(angle.cos(), 0.0, angle.sin());
            let total = shading_terms(normal, Vec3::X, normal).total();
            assert!(total <= prev + EPS, "shading must not brighten away from the light");
            prev = total;
        }
    }
}
