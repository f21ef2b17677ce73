//! Lifecycle of the rendered sphere on a drawable surface.
//!
//! ```text
//! Uninitialized --created--> Ready --resized/draw--> Rendering
//!        ^                     |                        |
//!        +---- setup failed    +-------destroyed--------+--> Destroyed
//! ```
//!
//! Every GPU resource is owned by [`SphereSurface`] and released through the
//! [`GraphicsContext`] when the surface is destroyed or re-created.

use std::fmt;

use log::{debug, error, info, warn};
use selene_lighting::PhaseHandle;
use selene_mesh::{MeshError, SphereMesh, generate_uv_sphere};
use thiserror::Error;

use crate::context::{
    ContextError, DrawCall, GraphicsContext, MeshHandle, ProgramHandle, RenderSettings,
    TextureHandle,
};
use crate::frame::{CameraError, CameraSettings, FrameRenderer, FrameState, SphereBindings};
use crate::shader::{ShaderError, ShaderProgram};
use crate::shaders::{SPHERE_FRAGMENT_SHADER, SPHERE_VERTEX_SHADER};
use crate::texture::{DecodedImage, TextureError, TexturePolicy};
use crate::uniforms::UniformBlocks;

/// Where a [`SphereSurface`] is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceState {
    /// No GPU resources exist.
    Uninitialized,
    /// Resources created, nothing drawn yet.
    Ready,
    /// At least one resize or frame has happened.
    Rendering,
    /// Resources released. Terminal.
    Destroyed,
}

impl fmt::Display for SurfaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Rendering => "rendering",
            Self::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Errors reported by the surface lifecycle.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("mesh generation failed: {0}")]
    Mesh(#[from] MeshError),

    #[error("invalid camera settings: {0}")]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    /// The graphics context failed. The surface is destroyed afterwards.
    #[error(transparent)]
    RenderContextLost(#[from] ContextError),

    /// The operation needs GPU resources the surface does not have.
    #[error("surface is not ready for this operation (state: {state})")]
    NotReady { state: SurfaceState },
}

/// Everything that shapes what the surface draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSettings {
    pub radius: f32,
    pub latitude_bands: u32,
    pub longitude_bands: u32,
    pub camera: CameraSettings,
    /// Spin about +Y per drawn frame. Zero keeps the sphere still.
    pub rotation_degrees_per_frame: f32,
    pub texture_policy: TexturePolicy,
    pub render: RenderSettings,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            radius: 1.0,
            latitude_bands: 50,
            longitude_bands: 50,
            camera: CameraSettings::default(),
            rotation_degrees_per_frame: 0.0,
            texture_policy: TexturePolicy::default(),
            render: RenderSettings::default(),
        }
    }
}

struct SurfaceResources {
    program: ProgramHandle,
    mesh: MeshHandle,
    texture: TextureHandle,
    bindings: SphereBindings,
    uniforms: UniformBlocks,
}

/// Handles created so far during setup, released if a later step fails.
#[derive(Default)]
struct PartialResources {
    program: Option<ProgramHandle>,
    mesh: Option<MeshHandle>,
    texture: Option<TextureHandle>,
}

impl PartialResources {
    fn release<C: GraphicsContext>(self, context: &mut C) {
        if let Some(texture) = self.texture {
            context.release_texture(texture);
        }
        if let Some(mesh) = self.mesh {
            context.release_mesh(mesh);
        }
        if let Some(program) = self.program {
            context.release_program(program);
        }
    }
}

/// The phase-lit textured sphere bound to one graphics context.
pub struct SphereSurface<C: GraphicsContext> {
    context: C,
    settings: SurfaceSettings,
    image: DecodedImage,
    phase: PhaseHandle,
    vertex_source: String,
    fragment_source: String,
    renderer: FrameRenderer,
    state: SurfaceState,
    resources: Option<SurfaceResources>,
}

impl<C: GraphicsContext> SphereSurface<C> {
    /// Create an uninitialized surface. Nothing touches the context until
    /// [`on_surface_created`](Self::on_surface_created).
    pub fn new(
        context: C,
        settings: SurfaceSettings,
        image: DecodedImage,
        phase: PhaseHandle,
    ) -> Self {
        Self {
            context,
            renderer: FrameRenderer::new(settings.camera, settings.rotation_degrees_per_frame),
            settings,
            image,
            phase,
            vertex_source: SPHERE_VERTEX_SHADER.to_owned(),
            fragment_source: SPHERE_FRAGMENT_SHADER.to_owned(),
            state: SurfaceState::Uninitialized,
            resources: None,
        }
    }

    /// Replace the built-in WGSL sources.
    pub fn with_shader_sources(
        mut self,
        vertex: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        self.vertex_source = vertex.into();
        self.fragment_source = fragment.into();
        self
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    pub fn frame_renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// A handle writing the phase this surface reads each frame.
    pub fn phase_handle(&self) -> PhaseHandle {
        self.phase.clone()
    }

    /// Build every GPU resource and the initial projection.
    ///
    /// Called again after the host recreates its context, in which case the
    /// previous resources are released first. On failure the surface is left
    /// `Uninitialized` with nothing allocated.
    pub fn on_surface_created(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        match self.state {
            SurfaceState::Destroyed => {
                return Err(SurfaceError::NotReady { state: self.state });
            }
            SurfaceState::Ready | SurfaceState::Rendering => {
                debug!("Surface re-created, releasing previous resources");
                self.release_resources();
                self.state = SurfaceState::Uninitialized;
            }
            SurfaceState::Uninitialized => {}
        }

        match self.setup(width, height) {
            Ok(resources) => {
                self.resources = Some(resources);
                self.state = SurfaceState::Ready;
                let (width, height) = self.renderer.viewport();
                info!("Sphere surface ready at {width}x{height}");
                Ok(())
            }
            Err(err) => {
                error!("Sphere surface setup failed: {err}");
                Err(err)
            }
        }
    }

    fn setup(&mut self, width: u32, height: u32) -> Result<SurfaceResources, SurfaceError> {
        self.settings.camera.validate()?;

        let mesh = generate_uv_sphere(
            self.settings.radius,
            self.settings.latitude_bands,
            self.settings.longitude_bands,
        )?;
        debug!(
            "Generated sphere: {} vertices, {} indices",
            mesh.vertex_count(),
            mesh.index_count()
        );

        let program = ShaderProgram::compile_and_link(&self.vertex_source, &self.fragment_source)?;
        debug!("Linked sphere program {}", program.id().get());
        let bindings = SphereBindings::resolve(&program);
        let unfed = bindings.attributes.unfed_inputs(&program);
        if !unfed.is_empty() {
            let inputs: Vec<String> = unfed
                .iter()
                .map(|input| format!("'{}' at location {}", input.name, input.location))
                .collect();
            return Err(ShaderError::Link {
                log: format!("no mesh attribute feeds vertex input {}", inputs.join(", ")),
            }
            .into());
        }

        self.context.configure(&self.settings.render);

        let mut partial = PartialResources::default();
        match self.upload(&mut partial, &program, &bindings, &mesh, width, height) {
            Ok((program_handle, mesh_handle, texture_handle)) => Ok(SurfaceResources {
                program: program_handle,
                mesh: mesh_handle,
                texture: texture_handle,
                bindings,
                uniforms: UniformBlocks::for_program(&program),
            }),
            Err(err) => {
                partial.release(&mut self.context);
                Err(err)
            }
        }
    }

    fn upload(
        &mut self,
        partial: &mut PartialResources,
        program: &ShaderProgram,
        bindings: &SphereBindings,
        mesh: &SphereMesh<u16>,
        width: u32,
        height: u32,
    ) -> Result<(ProgramHandle, MeshHandle, TextureHandle), SurfaceError> {
        let program = self.context.create_program(program, &bindings.attributes)?;
        partial.program = Some(program);

        let mesh = self.context.upload_mesh(mesh)?;
        partial.mesh = Some(mesh);

        let texture = self
            .context
            .upload_texture(&self.image, &self.settings.texture_policy)?;
        partial.texture = Some(texture);

        self.renderer.resize(width, height);
        self.context.set_viewport(width, height)?;

        Ok((program, mesh, texture))
    }

    /// Recompute the projection for a new viewport size.
    pub fn on_surface_resized(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if !matches!(self.state, SurfaceState::Ready | SurfaceState::Rendering) {
            return Err(SurfaceError::NotReady { state: self.state });
        }

        self.renderer.resize(width, height);
        let (width, height) = self.renderer.viewport();
        if let Err(err) = self.context.set_viewport(width, height) {
            return Err(self.lose(err));
        }
        debug!("Surface resized to {width}x{height}");
        self.state = SurfaceState::Rendering;
        Ok(())
    }

    /// Switch clear color and depth test.
    ///
    /// The clear color applies from the next frame. A pipeline built before
    /// the change keeps its depth state until the surface is re-created.
    pub fn on_render_settings_changed(
        &mut self,
        render: RenderSettings,
    ) -> Result<(), SurfaceError> {
        match self.state {
            SurfaceState::Destroyed => Err(SurfaceError::NotReady { state: self.state }),
            SurfaceState::Uninitialized => {
                self.settings.render = render;
                Ok(())
            }
            SurfaceState::Ready | SurfaceState::Rendering => {
                self.settings.render = render;
                self.context.configure(&render);
                debug!("Render settings changed: {render:?}");
                Ok(())
            }
        }
    }

    /// Draw one frame using the phase visible right now.
    pub fn on_draw_frame(&mut self) -> Result<FrameState, SurfaceError> {
        if !matches!(self.state, SurfaceState::Ready | SurfaceState::Rendering) {
            return Err(SurfaceError::NotReady { state: self.state });
        }
        let Some(resources) = self.resources.as_mut() else {
            return Err(SurfaceError::NotReady { state: self.state });
        };

        let frame = self.renderer.prepare(self.phase.phase());
        frame.write_uniforms(&resources.bindings, &mut resources.uniforms);

        let call = DrawCall {
            program: resources.program,
            mesh: resources.mesh,
            texture: resources.texture,
            uniforms: &resources.uniforms,
            texture_location: resources.bindings.surface_texture,
            sampler_location: resources.bindings.surface_sampler,
        };
        if let Err(err) = self.context.draw(&call) {
            return Err(self.lose(err));
        }

        self.renderer.advance();
        self.state = SurfaceState::Rendering;
        Ok(frame)
    }

    /// Release every GPU resource. Safe to call more than once.
    pub fn on_surface_destroyed(&mut self) {
        if self.state == SurfaceState::Destroyed {
            return;
        }
        self.release_resources();
        self.state = SurfaceState::Destroyed;
        info!(
            "Sphere surface destroyed after {} frames",
            self.renderer.frames_drawn()
        );
    }

    fn lose(&mut self, err: ContextError) -> SurfaceError {
        warn!("Graphics context failed, destroying surface: {err}");
        self.on_surface_destroyed();
        SurfaceError::RenderContextLost(err)
    }

    fn release_resources(&mut self) {
        if let Some(resources) = self.resources.take() {
            self.context.release_texture(resources.texture);
            self.context.release_mesh(resources.mesh);
            self.context.release_program(resources.program);
        }
    }
}

#[cfg(test)]
#[path = "surface_tests.rs"]
mod tests;
