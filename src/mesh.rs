//! Indexed mesh geometry and its conversion into a flat triangle soup.

use glam::{Vec3, Vec3A};

use crate::{BoundingBox, MeshError, Triangle};

/// Indexed triangle mesh as handed over by the scene
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub normals: Vec<Vec3>,
    /// Whole mesh bounds. The BVH root uses this box as is, so it must enclose every triangle.
    pub bounds: BoundingBox,
}

impl Mesh {
    /// Mesh with bounds computed from its positions
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Vec<Vec3>) -> Self {
        let mut bounds = BoundingBox::EMPTY;
        for position in &positions {
            bounds.grow(&Vec3A::from(*position));
        }
        Self::with_bounds(positions, indices, normals, bounds)
    }

    /// Mesh with externally precomputed bounds
    pub fn with_bounds(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Vec<Vec3>,
        bounds: BoundingBox,
    ) -> Self {
        Self {
            positions,
            indices,
            normals,
            bounds,
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangle soup of this mesh, see [`extract_triangles`]
    pub fn triangles(&self) -> Result<Vec<Triangle>, MeshError> {
        extract_triangles(&self.positions, &self.indices, &self.normals)
    }
}

/// Turn indexed geometry into one [`Triangle`] per index triple.
///
/// Fails if the index count is not a multiple of three, if positions and normals differ in
/// length, or if any index points past the vertex arrays.
pub fn extract_triangles(
    positions: &[Vec3],
    indices: &[u32],
    normals: &[Vec3],
) -> Result<Vec<Triangle>, MeshError> {
    if indices.len() % 3 != 0 {
        return Err(MeshError::IndexCountNotMultipleOfThree {
            count: indices.len(),
        });
    }

    if positions.len() != normals.len() {
        return Err(MeshError::NormalCountMismatch {
            positions: positions.len(),
            normals: normals.len(),
        });
    }

    let triangle_count = indices.len() / 3;
    if u32::try_from(triangle_count).is_err() {
        return Err(MeshError::TooManyTriangles {
            count: triangle_count,
        });
    }

    let vertex_count = positions.len();
    let mut triangles = Vec::with_capacity(triangle_count);

    for (triangle, chunk) in indices.chunks_exact(3).enumerate() {
        let mut corners = [0usize; 3];
        for (corner, &index) in corners.iter_mut().zip(chunk) {
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfBounds {
                    triangle,
                    index,
                    vertex_count,
                });
            }
            *corner = index as usize;
        }

        let [a, b, c] = corners;
        triangles.push(Triangle::new(
            positions[a].into(),
            positions[b].into(),
            positions[c].into(),
            normals[a].into(),
            normals[b].into(),
            normals[c].into(),
        ));
    }

    Ok(triangles)
}
