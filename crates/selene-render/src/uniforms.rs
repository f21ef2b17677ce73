//! CPU-side images of a program's uniform buffers.
//!
//! Values are written at the byte offsets reflected from the program and the
//! whole block is uploaded once per frame.

use glam::{Mat4, Vec3, Vec4};

use crate::shader::{ProgramId, ResourceKind, ShaderProgram, UniformLocation};

#[derive(Debug, Clone, PartialEq)]
struct BlockImage {
    group: u32,
    binding: u32,
    data: Vec<u8>,
}

/// Zero-initialized storage for every uniform buffer a program declares.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlocks {
    program: ProgramId,
    blocks: Vec<BlockImage>,
}

impl UniformBlocks {
    pub fn for_program(program: &ShaderProgram) -> Self {
        let blocks = program
            .resources()
            .iter()
            .filter_map(|slot| match slot.kind {
                ResourceKind::UniformBuffer { size } => Some(BlockImage {
                    group: slot.group,
                    binding: slot.binding,
                    data: vec![0; size as usize],
                }),
                _ => None,
            })
            .collect();

        Self {
            program: program.id(),
            blocks,
        }
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn set_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.write(location, bytemuck::bytes_of(&value.to_cols_array()));
    }

    pub fn set_vec3(&mut self, location: UniformLocation, value: Vec3) {
        self.write(location, bytemuck::bytes_of(&value.to_array()));
    }

    pub fn set_vec4(&mut self, location: UniformLocation, value: Vec4) {
        self.write(location, bytemuck::bytes_of(&value.to_array()));
    }

    pub fn set_f32(&mut self, location: UniformLocation, value: f32) {
        self.write(location, bytemuck::bytes_of(&value));
    }

    /// Contents of the block at `group`/`binding`.
    pub fn block(&self, group: u32, binding: u32) -> Option<&[u8]> {
        self.blocks
            .iter()
            .find(|b| b.group == group && b.binding == binding)
            .map(|b| b.data.as_slice())
    }

    /// `(group, binding, bytes)` for every block.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &[u8])> {
        self.blocks
            .iter()
            .map(|b| (b.group, b.binding, b.data.as_slice()))
    }

    /// Copy `bytes` into the slot named by `location`.
    ///
    /// Invalid locations, locations of another program, and resource slots are
    /// ignored. Values longer than the slot are truncated to it.
    fn write(&mut self, location: UniformLocation, bytes: &[u8]) {
        let UniformLocation::Block {
            program,
            group,
            binding,
            offset,
            size,
        } = location
        else {
            return;
        };
        if program != self.program {
            return;
        }
        let Some(block) = self
            .blocks
            .iter_mut()
            .find(|b| b.group == group && b.binding == binding)
        else {
            return;
        };

        let start = offset as usize;
        let len = bytes.len().min(size as usize);
        if let Some(dst) = block.data.get_mut(start..start + len) {
            dst.copy_from_slice(&bytes[..len]);
        }
    }
}
