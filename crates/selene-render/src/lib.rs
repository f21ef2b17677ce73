//! Phase-lit textured sphere rendering: shader program reflection, texture
//! upload, per-frame matrices, the surface lifecycle and its render thread.

pub mod buffer;
pub mod context;
pub mod depth;
pub mod frame;
pub mod gpu;
pub mod headless;
pub mod render_loop;
pub mod shader;
pub mod shaders;
pub mod surface;
pub mod texture;
pub mod uniforms;
pub mod wgpu_context;

pub use buffer::{MeshBuffer, SphereAttributes, index_format};
pub use context::{
    ContextError, DrawCall, GraphicsContext, MeshHandle, ProgramHandle, RenderSettings,
    TextureHandle,
};
pub use depth::DepthBuffer;
pub use frame::{CameraError, CameraSettings, FrameRenderer, FrameState, SphereBindings, frustum};
pub use gpu::{RenderContext, RenderContextError, init_render_context_blocking};
pub use headless::{Command, CommandLog, HeadlessContext};
pub use render_loop::{RENDER_THREAD_NAME, RenderLoop, RenderStats, SurfaceEvent};
pub use shader::{
    AttributeLocation, ProgramId, ResourceKind, ResourceSlot, ShaderError, ShaderProgram,
    ShaderStage, UniformLocation,
};
pub use shaders::{SPHERE_FRAGMENT_SHADER, SPHERE_VERTEX_SHADER};
pub use surface::{SphereSurface, SurfaceError, SurfaceSettings, SurfaceState};
pub use texture::{
    DecodedImage, PixelFormat, SurfaceTexture, TextureError, TexturePolicy, mip_level_count,
    prepare_image,
};
pub use uniforms::UniformBlocks;
pub use wgpu_context::WgpuContext;
