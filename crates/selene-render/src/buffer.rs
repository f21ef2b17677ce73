//! Vertex and index buffers for the sphere mesh.

use selene_mesh::{MeshIndex, SphereMesh, SphereVertex};
use wgpu::util::DeviceExt;

use crate::shader::{AttributeLocation, ProgramId, ShaderProgram, VertexAttribute};

/// The sphere's geometry on the GPU.
pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub index_format: wgpu::IndexFormat,
}

impl MeshBuffer {
    /// Upload interleaved vertices and the index list of `mesh`.
    pub fn from_mesh<I: MeshIndex>(device: &wgpu::Device, mesh: &SphereMesh<I>) -> Self {
        let vertices = mesh.interleaved();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere-vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere-indices"),
            contents: bytemuck::cast_slice(mesh.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count() as u32,
            index_format: index_format::<I>(),
        }
    }

    /// Bind vertex and index buffers to a render pass.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), self.index_format);
    }

    /// Draw the entire mesh using indexed rendering.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// GPU index format for an index element type.
pub fn index_format<I: MeshIndex>() -> wgpu::IndexFormat {
    if I::MAX_INDEX <= u64::from(u16::MAX) {
        wgpu::IndexFormat::Uint16
    } else {
        wgpu::IndexFormat::Uint32
    }
}

/// Resolved attribute locations for the three sphere vertex streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphereAttributes {
    pub position: AttributeLocation,
    pub normal: AttributeLocation,
    pub texcoord: AttributeLocation,
}

impl SphereAttributes {
    /// Describe where each attribute sits in a [`SphereVertex`].
    ///
    /// Attributes the program does not consume are left out, the way an
    /// attribute pointer for an unused location is never enabled.
    pub fn vertex_attributes(&self, program: ProgramId) -> Vec<wgpu::VertexAttribute> {
        [
            (
                self.position,
                SphereVertex::POSITION_OFFSET,
                wgpu::VertexFormat::Float32x3,
            ),
            (
                self.normal,
                SphereVertex::NORMAL_OFFSET,
                wgpu::VertexFormat::Float32x3,
            ),
            (
                self.texcoord,
                SphereVertex::UV_OFFSET,
                wgpu::VertexFormat::Float32x2,
            ),
        ]
        .into_iter()
        .filter_map(|(location, offset, format)| {
            location
                .slot_for(program)
                .map(|shader_location| wgpu::VertexAttribute {
                    format,
                    offset,
                    shader_location,
                })
        })
        .collect()
    }

    /// Vertex inputs of `program` that no sphere attribute feeds.
    pub fn unfed_inputs<'p>(&self, program: &'p ShaderProgram) -> Vec<&'p VertexAttribute> {
        let fed: Vec<u32> = [self.position, self.normal, self.texcoord]
            .iter()
            .filter_map(|location| location.slot_for(program.id()))
            .collect();
        program
            .attributes()
            .iter()
            .filter(|input| !fed.contains(&input.location))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;
    use crate::shader::ShaderProgram;
    use crate::shaders::{SPHERE_FRAGMENT_SHADER, SPHERE_VERTEX_SHADER, names};

    #[test]
    fn test_index_format_follows_index_width() {
        assert_eq!(index_format::<u16>(), wgpu::IndexFormat::Uint16);
        assert_eq!(index_format::<u32>(), wgpu::IndexFormat::Uint32);
    }

    #[test]
    fn test_vertex_attributes_use_resolved_locations() {
        let program =
            ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, SPHERE_FRAGMENT_SHADER).unwrap();
        let attributes = SphereAttributes {
            position: program.attribute_location(names::POSITION),
            normal: program.attribute_location(names::NORMAL),
            texcoord: program.attribute_location(names::TEXCOORD),
        };

        let layout = attributes.vertex_attributes(program.id());
        assert_eq!(layout.len(), 3);
        assert_eq!(layout[1].shader_location, 1);
        assert_eq!(layout[1].offset, 12);
        assert_eq!(layout[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn test_invalid_attribute_is_left_out() {
        let program =
            ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, SPHERE_FRAGMENT_SHADER).unwrap();
        let attributes = SphereAttributes {
            position: program.attribute_location(names::POSITION),
            normal: AttributeLocation::Invalid,
            texcoord: program.attribute_location("uv"),
        };
        let layout = attributes.vertex_attributes(program.id());
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].shader_location, 0);
    }

    #[test]
    fn test_unfed_inputs_lists_inputs_without_attributes() {
        let program =
            ShaderProgram::compile_and_link(SPHERE_VERTEX_SHADER, SPHERE_FRAGMENT_SHADER).unwrap();
        let attributes = SphereAttributes {
            position: program.attribute_location(names::POSITION),
            normal: program.attribute_location(names::NORMAL),
            texcoord: program.attribute_location(names::TEXCOORD),
        };
        assert!(attributes.unfed_inputs(&program).is_empty());

        let missing_texcoord = SphereAttributes {
            texcoord: AttributeLocation::Invalid,
            ..attributes
        };
        let unfed = missing_texcoord.unfed_inputs(&program);
        assert_eq!(unfed.len(), 1);
        assert_eq!(unfed[0].name, names::TEXCOORD);
        assert_eq!(unfed[0].location, 2);
    }

    #[test]
    fn test_mesh_buffer_from_sphere() {
        let Some((device, _queue)) = create_test_device_queue() else {
            return;
        };
        let mesh = selene_mesh::generate_uv_sphere(1.0, 8, 12).unwrap();
        let buffer = MeshBuffer::from_mesh(&device, &mesh);

        assert_eq!(buffer.index_count, 6 * 8 * 12);
        assert_eq!(buffer.index_format, wgpu::IndexFormat::Uint16);
        assert_eq!(
            buffer.vertex_buffer.size(),
            mesh.vertex_count() as u64 * SphereVertex::STRIDE
        );
    }
}
