//! Interleaved vertex layout for GPU upload.

use bytemuck::{Pod, Zeroable};

use crate::index::MeshIndex;
use crate::sphere::SphereMesh;

/// One sphere vertex as laid out in the vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl SphereVertex {
    /// Byte stride of one vertex.
    pub const STRIDE: u64 = std::mem::size_of::<Self>() as u64;
    /// Byte offset of `position` within a vertex.
    pub const POSITION_OFFSET: u64 = 0;
    /// Byte offset of `normal` within a vertex.
    pub const NORMAL_OFFSET: u64 = 12;
    /// Byte offset of `uv` within a vertex.
    pub const UV_OFFSET: u64 = 24;
}

impl<I: MeshIndex> SphereMesh<I> {
    /// Zip the parallel attribute arrays into interleaved vertices.
    pub fn interleaved(&self) -> Vec<SphereVertex> {
        self.positions()
            .iter()
            .zip(self.normals())
            .zip(self.uvs())
            .map(|((&position, &normal), &uv)| SphereVertex {
                position,
                normal,
                uv,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::generate_uv_sphere;

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(SphereVertex::STRIDE, 32);
        assert_eq!(std::mem::offset_of!(SphereVertex, normal) as u64, SphereVertex::NORMAL_OFFSET);
        assert_eq!(std::mem::offset_of!(SphereVertex, uv) as u64, SphereVertex::UV_OFFSET);
    }

    #[test]
    fn test_interleaved_matches_attribute_arrays() {
        let mesh = generate_uv_sphere(2.0, 6, 9).unwrap();
        let vertices = mesh.interleaved();

        assert_eq!(vertices.len(), mesh.vertex_count());
        for (i, v) in vertices.iter().enumerate() {
            assert_eq!(v.position, mesh.positions()[i]);
            assert_eq!(v.normal, mesh.normals()[i]);
            assert_eq!(v.uv, mesh.uvs()[i]);
        }

        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len() as u64, vertices.len() as u64 * SphereVertex::STRIDE);
    }
}
