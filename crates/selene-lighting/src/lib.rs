//! Phase-driven lighting for the sphere: where the light sits for a given
//! phase, how a surface point is shaded, and the lock-free cell the input side
//! uses to publish the phase to the render thread.

mod phase;
mod shading;

pub use phase::{PhaseCell, PhaseHandle, light_direction_for, wrap_phase};
pub use shading::{
    AMBIENT_STRENGTH, DARK_SIDE_AMBIENT, SHININESS, SPECULAR_STRENGTH, ShadingTerms, shade,
    shading_terms,
};
