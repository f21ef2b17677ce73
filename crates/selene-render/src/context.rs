//! The graphics API seam.
//!
//! [`SphereSurface`](crate::SphereSurface) drives rendering through
//! [`GraphicsContext`] only, so the same lifecycle runs against a real wgpu
//! device ([`WgpuContext`](crate::WgpuContext)) or the command recorder
//! ([`HeadlessContext`](crate::HeadlessContext)).

use selene_mesh::{MeshIndex, SphereMesh};

use crate::buffer::SphereAttributes;
use crate::shader::{ShaderProgram, UniformLocation};
use crate::texture::{DecodedImage, TextureError, TexturePolicy};
use crate::uniforms::UniformBlocks;

/// A program created on the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u64);

/// Vertex and index buffers created on the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u64);

/// A sampled texture created on the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Fixed-function state applied once after setup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Linear RGBA clear color.
    pub clear_color: [f32; 4],
    pub depth_test: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_test: true,
        }
    }
}

/// Failures reported by a graphics context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The device or presentation surface is gone.
    #[error("graphics context lost: {reason}")]
    Lost { reason: String },

    /// A handle that was never created or has been released.
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u64 },

    /// The program cannot be turned into a pipeline on this context.
    #[error("pipeline creation failed: {reason}")]
    Pipeline { reason: String },
}

/// Everything needed to issue one indexed draw of the sphere.
#[derive(Debug, Clone, Copy)]
pub struct DrawCall<'a> {
    pub program: ProgramHandle,
    pub mesh: MeshHandle,
    pub texture: TextureHandle,
    /// Uniform buffer contents for this frame.
    pub uniforms: &'a UniformBlocks,
    /// Slot the texture is bound to. Ignored when invalid.
    pub texture_location: UniformLocation,
    /// Slot the sampler is bound to. Ignored when invalid.
    pub sampler_location: UniformLocation,
}

/// Operations the surface lifecycle needs from a graphics API.
pub trait GraphicsContext {
    /// Build GPU state for a linked program, feeding `attributes` from the
    /// sphere vertex layout.
    fn create_program(
        &mut self,
        program: &ShaderProgram,
        attributes: &SphereAttributes,
    ) -> Result<ProgramHandle, ContextError>;

    fn upload_mesh<I: MeshIndex>(&mut self, mesh: &SphereMesh<I>)
    -> Result<MeshHandle, ContextError>;

    /// Upload a texture after applying `policy`.
    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        policy: &TexturePolicy,
    ) -> Result<TextureHandle, TextureError>;

    /// Apply clear color and depth test state.
    fn configure(&mut self, settings: &RenderSettings);

    /// Resize the drawable area. Zero sizes are clamped to one pixel.
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), ContextError>;

    /// Clear color and depth, then draw the sphere.
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), ContextError>;

    fn release_program(&mut self, handle: ProgramHandle);

    fn release_mesh(&mut self, handle: MeshHandle);

    fn release_texture(&mut self, handle: TextureHandle);
}
