//! A graphics context that records commands instead of touching a GPU.
//!
//! Used by tests and `--headless` runs. Resource handles are tracked so a
//! draw that references a released resource fails the same way a real
//! context would, and the context can be marked lost to exercise recovery.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use selene_mesh::{MeshIndex, SphereMesh};

use crate::buffer::SphereAttributes;
use crate::context::{
    ContextError, DrawCall, GraphicsContext, MeshHandle, ProgramHandle, RenderSettings,
    TextureHandle,
};
use crate::shader::ShaderProgram;
use crate::texture::{DecodedImage, TextureError, TexturePolicy, mip_level_count, prepare_image};

/// One recorded context operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CreateProgram {
        handle: ProgramHandle,
        /// `(shader_location, byte_offset)` of every fed attribute.
        attributes: Vec<(u32, u64)>,
    },
    UploadMesh {
        handle: MeshHandle,
        vertex_count: usize,
        index_count: usize,
    },
    UploadTexture {
        handle: TextureHandle,
        width: u32,
        height: u32,
        mip_levels: u32,
    },
    Configure(RenderSettings),
    Viewport {
        width: u32,
        height: u32,
    },
    Draw {
        program: ProgramHandle,
        mesh: MeshHandle,
        texture: TextureHandle,
        index_count: u32,
        clear_color: [f32; 4],
        /// `(group, binding, bytes)` of every uniform block.
        uniforms: Vec<(u32, u32, Vec<u8>)>,
    },
    ReleaseProgram(ProgramHandle),
    ReleaseMesh(MeshHandle),
    ReleaseTexture(TextureHandle),
}

/// Shared view of the commands a [`HeadlessContext`] has recorded.
///
/// Holds at most `capacity` commands; older ones are dropped first.
#[derive(Clone, Debug)]
pub struct CommandLog {
    inner: Arc<Mutex<LogInner>>,
}

#[derive(Debug)]
struct LogInner {
    commands: VecDeque<Command>,
    capacity: usize,
    draws: u64,
}

impl CommandLog {
    pub const DEFAULT_CAPACITY: usize = 4096;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogInner {
                commands: VecDeque::new(),
                capacity: capacity.max(1),
                draws: 0,
            })),
        }
    }

    fn push(&self, command: Command) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(command, Command::Draw { .. }) {
            inner.draws += 1;
        }
        if inner.commands.len() == inner.capacity {
            inner.commands.pop_front();
        }
        inner.commands.push_back(command);
    }

    /// Copy of the retained commands, oldest first.
    pub fn commands(&self) -> Vec<Command> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.commands.iter().cloned().collect()
    }

    /// Total draws recorded, including ones no longer retained.
    pub fn draw_count(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .draws
    }

    /// The most recent draw command, if any is retained.
    pub fn last_draw(&self) -> Option<Command> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .commands
            .iter()
            .rev()
            .find(|c| matches!(c, Command::Draw { .. }))
            .cloned()
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

/// Records every operation into a [`CommandLog`].
#[derive(Debug)]
pub struct HeadlessContext {
    log: CommandLog,
    next_handle: u64,
    programs: HashSet<u64>,
    meshes: HashMap<u64, u32>,
    textures: HashSet<u64>,
    settings: RenderSettings,
    viewport: (u32, u32),
    lost: bool,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::with_log(CommandLog::default())
    }

    pub fn with_log(log: CommandLog) -> Self {
        Self {
            log,
            next_handle: 1,
            programs: HashSet::new(),
            meshes: HashMap::new(),
            textures: HashSet::new(),
            settings: RenderSettings::default(),
            viewport: (1, 1),
            lost: false,
        }
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Number of live resources of all kinds.
    pub fn live_resources(&self) -> usize {
        self.programs.len() + self.meshes.len() + self.textures.len()
    }

    /// Simulate device loss: every later fallible call fails.
    pub fn lose_context(&mut self) {
        self.lost = true;
    }

    fn check_lost(&self) -> Result<(), ContextError> {
        if self.lost {
            return Err(ContextError::Lost {
                reason: "headless context marked lost".to_owned(),
            });
        }
        Ok(())
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsContext for HeadlessContext {
    fn create_program(
        &mut self,
        program: &ShaderProgram,
        attributes: &SphereAttributes,
    ) -> Result<ProgramHandle, ContextError> {
        self.check_lost()?;
        let handle = ProgramHandle(self.allocate());
        self.programs.insert(handle.0);
        self.log.push(Command::CreateProgram {
            handle,
            attributes: attributes
                .vertex_attributes(program.id())
                .iter()
                .map(|a| (a.shader_location, a.offset))
                .collect(),
        });
        Ok(handle)
    }

    fn upload_mesh<I: MeshIndex>(
        &mut self,
        mesh: &SphereMesh<I>,
    ) -> Result<MeshHandle, ContextError> {
        self.check_lost()?;
        let handle = MeshHandle(self.allocate());
        self.meshes.insert(handle.0, mesh.index_count() as u32);
        self.log.push(Command::UploadMesh {
            handle,
            vertex_count: mesh.vertex_count(),
            index_count: mesh.index_count(),
        });
        Ok(handle)
    }

    fn upload_texture(
        &mut self,
        image: &DecodedImage,
        policy: &TexturePolicy,
    ) -> Result<TextureHandle, TextureError> {
        if self.lost {
            return Err(TextureError::UploadFailed {
                reason: "headless context marked lost".to_owned(),
            });
        }
        let prepared = prepare_image(image, policy)?;
        let mip_levels = if policy.generate_mipmaps {
            mip_level_count(prepared.width, prepared.height)
        } else {
            1
        };

        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle.0);
        self.log.push(Command::UploadTexture {
            handle,
            width: prepared.width,
            height: prepared.height,
            mip_levels,
        });
        Ok(handle)
    }

    fn configure(&mut self, settings: &RenderSettings) {
        self.settings = *settings;
        self.log.push(Command::Configure(*settings));
    }

    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), ContextError> {
        self.check_lost()?;
        self.viewport = (width.max(1), height.max(1));
        self.log.push(Command::Viewport {
            width: self.viewport.0,
            height: self.viewport.1,
        });
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), ContextError> {
        self.check_lost()?;
        if !self.programs.contains(&call.program.0) {
            return Err(ContextError::UnknownHandle {
                kind: "program",
                id: call.program.0,
            });
        }
        let Some(&index_count) = self.meshes.get(&call.mesh.0) else {
            return Err(ContextError::UnknownHandle {
                kind: "mesh",
                id: call.mesh.0,
            });
        };
        if !self.textures.contains(&call.texture.0) {
            return Err(ContextError::UnknownHandle {
                kind: "texture",
                id: call.texture.0,
            });
        }

        self.log.push(Command::Draw {
            program: call.program,
            mesh: call.mesh,
            texture: call.texture,
            index_count,
            clear_color: self.settings.clear_color,
            uniforms: call
                .uniforms
                .iter()
                .map(|(group, binding, bytes)| (group, binding, bytes.to_vec()))
                .collect(),
        });
        Ok(())
    }

    fn release_program(&mut self, handle: ProgramHandle) {
        if self.programs.remove(&handle.0) {
            self.log.push(Command::ReleaseProgram(handle));
        }
    }

    fn release_mesh(&mut self, handle: MeshHandle) {
        if self.meshes.remove(&handle.0).is_some() {
            self.log.push(Command::ReleaseMesh(handle));
        }
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle.0) {
            self.log.push(Command::ReleaseTexture(handle));
        }
    }
}
