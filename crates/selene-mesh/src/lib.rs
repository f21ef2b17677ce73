//! Procedural UV-sphere generation: positions, normals, texture coordinates and
//! triangle indices for the textured sphere.

mod index;
mod sphere;
mod vertex;

pub use index::MeshIndex;
pub use sphere::{
    MIN_LATITUDE_BANDS, MIN_LONGITUDE_BANDS, MeshError, SphereMesh, generate_uv_sphere,
    generate_uv_sphere_indexed, required_max_index,
};
pub use vertex::SphereVertex;
