//! Terrain mesh data produced by the builders.

use glam::Vec3;

/// How a mesh's vertices relate to its triangles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Shading {
    /// Three unique vertices per triangle, one normal and color per triangle.
    #[default]
    Flat,
    /// One shared vertex per grid sample with averaged normals.
    Smooth,
}

/// Violations of the mesh invariants.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MeshError {
    #[error("index {index} at position {position} exceeds vertex count {vertex_count}")]
    IndexOutOfBounds {
        position: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("index count {0} is not a multiple of 3")]
    PartialTriangle(usize),
    #[error("attribute array lengths differ: {positions} positions, {normals} normals, {colors} colors")]
    AttributeMismatch {
        positions: usize,
        normals: usize,
        colors: usize,
    },
    #[error("triangle {0} faces downward")]
    InvertedWinding(usize),
}

/// Vertex positions, normals, colors and triangle indices of one chunk.
///
/// Positions are relative to the chunk origin; `y` is the terrain height.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    /// Linear RGBA.
    pub colors: Vec<[f32; 4]>,
    /// Triangles, 3 indices each.
    pub indices: Vec<u32>,
    pub shading: Shading,
}

impl MeshData {
    pub fn with_capacity(shading: Shading, vertices: usize, indices: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            colors: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
            shading,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends one vertex and returns its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, color: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        self.colors.push(color.extend(1.0).to_array());
        index
    }

    /// Corner positions of triangle `t`.
    pub fn triangle(&self, t: usize) -> [Vec3; 3] {
        let i = &self.indices[t * 3..t * 3 + 3];
        [
            Vec3::from_array(self.positions[i[0] as usize]),
            Vec3::from_array(self.positions[i[1] as usize]),
            Vec3::from_array(self.positions[i[2] as usize]),
        ]
    }

    /// Unnormalized face normal of triangle `t` from its winding.
    pub fn face_normal(&self, t: usize) -> Vec3 {
        let [a, b, c] = self.triangle(t);
        (b - a).cross(c - a)
    }

    /// Checks index bounds, attribute lengths and that every triangle of
    /// the heightfield winds with its normal pointing up.
    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.positions.len();
        if self.normals.len() != n || self.colors.len() != n {
            return Err(MeshError::AttributeMismatch {
                positions: n,
                normals: self.normals.len(),
                colors: self.colors.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::PartialTriangle(self.indices.len()));
        }
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= n)
        {
            return Err(MeshError::IndexOutOfBounds {
                position,
                index,
                vertex_count: n,
            });
        }
        for t in 0..self.triangle_count() {
            if self.face_normal(t).y <= 0.0 {
                return Err(MeshError::InvertedWinding(t));
            }
        }
        Ok(())
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.positions.len() * (12 + 12 + 16) + self.indices.len() * 4
    }
}
