//! Latitude/longitude sphere generation.
//!
//! Vertices are laid out row by row from the north pole (`lat = 0`, +Y) to the
//! south pole, each row holding `longitude_bands + 1` vertices so the seam at
//! `u = 1.0` gets its own copy of the first column.

use std::f64::consts::{PI, TAU};

use crate::index::MeshIndex;

/// Fewest latitude bands that still enclose a volume.
pub const MIN_LATITUDE_BANDS: u32 = 2;
/// Fewest longitude bands that still enclose a volume.
pub const MIN_LONGITUDE_BANDS: u32 = 3;

/// Errors raised while generating a sphere mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// The requested subdivision produces vertex slots the index type cannot address.
    #[error(
        "{latitude_bands}x{longitude_bands} sphere needs index {max_index}, \
         beyond the {index_type} limit of {limit}"
    )]
    Overflow {
        latitude_bands: u32,
        longitude_bands: u32,
        max_index: u64,
        limit: u64,
        index_type: &'static str,
    },

    /// Radius or band counts outside the accepted domain.
    #[error("invalid sphere parameters: {reason}")]
    InvalidParameters { reason: String },
}

/// An immutable UV-sphere mesh.
///
/// `positions`, `normals` and `uvs` are parallel arrays; every index refers to
/// a slot in them.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereMesh<I: MeshIndex = u16> {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<I>,
    radius: f32,
    latitude_bands: u32,
    longitude_bands: u32,
}

impl<I: MeshIndex> SphereMesh<I> {
    /// Vertex positions, scaled by the radius.
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    /// Unit normals, one per vertex.
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Texture coordinates: U follows longitude, V follows latitude.
    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// Triangle list indices, three per triangle.
    pub fn indices(&self) -> &[I] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// `(latitude_bands, longitude_bands)` used to build the mesh.
    pub fn bands(&self) -> (u32, u32) {
        (self.latitude_bands, self.longitude_bands)
    }
}

/// Highest vertex slot a sphere with the given subdivision will reference.
pub fn required_max_index(latitude_bands: u32, longitude_bands: u32) -> u64 {
    (u64::from(latitude_bands) + 1) * (u64::from(longitude_bands) + 1) - 1
}

/// Generate a sphere with 16-bit indices.
///
/// 16-bit indices cap the subdivision at 65 536 vertices; finer spheres fail
/// with [`MeshError::Overflow`]. Use [`generate_uv_sphere_indexed`] with `u32`
/// for denser meshes.
pub fn generate_uv_sphere(
    radius: f32,
    latitude_bands: u32,
    longitude_bands: u32,
) -> Result<SphereMesh<u16>, MeshError> {
    generate_uv_sphere_indexed::<u16>(radius, latitude_bands, longitude_bands)
}

/// Generate a sphere with an arbitrary index width.
pub fn generate_uv_sphere_indexed<I: MeshIndex>(
    radius: f32,
    latitude_bands: u32,
    longitude_bands: u32,
) -> Result<SphereMesh<I>, MeshError> {
    validate(radius, latitude_bands, longitude_bands)?;

    let max_index = required_max_index(latitude_bands, longitude_bands);
    if max_index > I::MAX_INDEX {
        return Err(MeshError::Overflow {
            latitude_bands,
            longitude_bands,
            max_index,
            limit: I::MAX_INDEX,
            index_type: I::TYPE_NAME,
        });
    }

    let vertex_count = (max_index + 1) as usize;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);
    let r = f64::from(radius);

    for lat in 0..=latitude_bands {
        let theta = f64::from(lat) * PI / f64::from(latitude_bands);
        let (sin_theta, cos_theta) = theta.sin_cos();

        for lon in 0..=longitude_bands {
            let phi = f64::from(lon) * TAU / f64::from(longitude_bands);
            let (sin_phi, cos_phi) = phi.sin_cos();

            let x = sin_theta * cos_phi;
            let y = cos_theta;
            let z = sin_theta * sin_phi;

            positions.push([(x * r) as f32, (y * r) as f32, (z * r) as f32]);
            normals.push([x as f32, y as f32, z as f32]);
            uvs.push([
                lon as f32 / longitude_bands as f32,
                lat as f32 / latitude_bands as f32,
            ]);
        }
    }

    let row = longitude_bands + 1;
    let mut indices = Vec::with_capacity(6 * latitude_bands as usize * longitude_bands as usize);
    for lat in 0..latitude_bands {
        for lon in 0..longitude_bands {
            let first = lat * row + lon;
            let second = first + row;

            indices.extend_from_slice(&[
                I::from_slot(first),
                I::from_slot(second),
                I::from_slot(first + 1),
                I::from_slot(second),
                I::from_slot(second + 1),
                I::from_slot(first + 1),
            ]);
        }
    }

    Ok(SphereMesh {
        positions,
        normals,
        uvs,
        indices,
        radius,
        latitude_bands,
        longitude_bands,
    })
}

fn validate(radius: f32, latitude_bands: u32, longitude_bands: u32) -> Result<(), MeshError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(MeshError::InvalidParameters {
            reason: format!("radius must be positive and finite, got {radius}"),
        });
    }
    if latitude_bands < MIN_LATITUDE_BANDS {
        return Err(MeshError::InvalidParameters {
            reason: format!(
                "latitude_bands must be at least {MIN_LATITUDE_BANDS}, got {latitude_bands}"
            ),
        });
    }
    if longitude_bands < MIN_LONGITUDE_BANDS {
        return Err(MeshError::InvalidParameters {
            reason: format!(
                "longitude_bands must be at least {MIN_LONGITUDE_BANDS}, got {longitude_bands}"
            ),
        });
    }
    Ok(())
}
