//! Phase scalar and the orbiting light direction derived from it.
//!
//! A phase of `0.0` puts the light on +X, `0.25` on +Z, `0.5` on -X and
//! `0.75` on -Z. The light orbits in the XZ plane and never leaves it.

use std::f32::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;

/// Reduce a phase to `[0, 1)`.
///
/// Out-of-range values wrap rather than clamp so a full orbit past `1.0`
/// continues smoothly. Non-finite input maps to `0.0`.
pub fn wrap_phase(phase: f32) -> f32 {
    if !phase.is_finite() {
        return 0.0;
    }
    let wrapped = phase.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs.
    if wrapped >= 1.0 { 0.0 } else { wrapped }
}

/// Unit vector pointing toward the light for the given phase.
pub fn light_direction_for(phase: f32) -> Vec3 {
    let angle = wrap_phase(phase) * TAU;
    let (sin, cos) = angle.sin_cos();
    Vec3::new(cos, 0.0, sin)
}

/// A single `f32` shared between the input side and the render thread.
///
/// Stored as raw bits in an [`AtomicU32`]; a reader always sees some value
/// that was written in full.
#[derive(Debug, Default)]
pub struct PhaseCell {
    bits: AtomicU32,
}

impl PhaseCell {
    pub fn new(phase: f32) -> Self {
        Self {
            bits: AtomicU32::new(phase.to_bits()),
        }
    }

    /// Publish a new phase. The value is stored unvalidated; readers wrap it.
    pub fn store(&self, phase: f32) {
        self.bits.store(phase.to_bits(), Ordering::Release);
    }

    /// Snapshot the most recently published phase.
    pub fn load(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Cloneable writer/reader handle to a shared [`PhaseCell`].
#[derive(Clone, Debug, Default)]
pub struct PhaseHandle {
    cell: Arc<PhaseCell>,
}

impl PhaseHandle {
    pub fn new(initial: f32) -> Self {
        Self {
            cell: Arc::new(PhaseCell::new(initial)),
        }
    }

    pub fn set_phase(&self, phase: f32) {
        self.cell.store(phase);
    }

    pub fn phase(&self) -> f32 {
        self.cell.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < EPS
    }

    #[test]
    fn test_cardinal_phases() {
        assert_eq!(light_direction_for(0.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(approx(light_direction_for(0.25), Vec3::Z));
        assert!(approx(light_direction_for(0.5), Vec3::NEG_X));
        assert!(approx(light_direction_for(0.75), Vec3::NEG_Z));
    }

    #[test]
    fn test_direction_is_periodic() {
        for i in 0..40 {
            let p = i as f32 * 0.025;
            assert!(
                approx(light_direction_for(p), light_direction_for(p + 1.0)),
                "phase {p} and {} should coincide",
                p + 1.0
            );
            assert!(approx(light_direction_for(p), light_direction_for(p - 3.0)));
        }
    }

    #[test]
    fn test_direction_is_unit_and_planar() {
        for i in 0..100 {
            let dir = light_direction_for(i as f32 / 100.0);
            assert!((dir.length() - 1.0).abs() < EPS);
            assert_eq!(dir.y, 0.0);
        }
    }

    #[test]
    fn test_non_finite_phase_is_treated_as_zero() {
        assert_eq!(wrap_phase(f32::NAN), 0.0);
        assert_eq!(wrap_phase(f32::INFINITY), 0.0);
        assert_eq!(light_direction_for(f32::NEG_INFINITY), Vec3::X);
    }

    #[test]
    fn test_wrap_phase_stays_in_unit_interval() {
        for p in [-1e-9_f32, -0.25, 1.0, 1.75, 42.5, -7.1] {
            let w = wrap_phase(p);
            assert!((0.0..1.0).contains(&w), "wrap_phase({p}) = {w}");
        }
        assert!((wrap_phase(1.75) - 0.75).abs() < EPS);
        assert!((wrap_phase(-0.25) - 0.75).abs() < EPS);
    }

    #[test]
    fn test_handle_clones_share_state() {
        let writer = PhaseHandle::new(0.1);
        let reader = writer.clone();
        writer.set_phase(0.6);
        assert_eq!(reader.phase(), 0.6);
    }

    #[test]
    fn test_cell_preserves_exact_bits() {
        let cell = PhaseCell::default();
        assert_eq!(cell.load(), 0.0);
        cell.store(-0.0);
        assert!(cell.load().is_sign_negative());
        cell.store(f32::NAN);
        assert!(cell.load().is_nan());
    }
}
