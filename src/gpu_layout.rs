//! Wire records consumed by the GPU traversal stage.
//!
//! Every record is `#[repr(C)]` plain old data without implicit padding, so whole buffers can
//! be uploaded with [`bytemuck::cast_slice`]. Integers are unsigned 32 bit.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::{BvhNode, BvhTree, Triangle};

/// GPU BVH node (40 bytes).
///
/// `child1`, `child2` and `triangle_offset` are local to the mesh the node belongs to. A leaf
/// has `child1 == 0`. Empty nodes carry an inverted box (`+inf`, `-inf`) no ray can enter.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuBvhNode {
    pub box_min: [f32; 3],
    pub child1: u32,
    pub box_max: [f32; 3],
    pub child2: u32,
    pub triangle_offset: u32,
    pub triangle_count: u32,
}

impl GpuBvhNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child1 == BvhNode::NO_CHILD
    }
}

impl From<&BvhNode> for GpuBvhNode {
    #[inline]
    fn from(node: &BvhNode) -> Self {
        Self {
            box_min: node.bounds.min.to_array(),
            child1: node.child1,
            box_max: node.bounds.max.to_array(),
            child2: node.child2,
            triangle_offset: node.triangle_offset,
            triangle_count: node.triangle_count,
        }
    }
}

/// GPU triangle: three positions then three normals (72 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    pub p0: [f32; 3],
    pub p1: [f32; 3],
    pub p2: [f32; 3],
    pub n0: [f32; 3],
    pub n1: [f32; 3],
    pub n2: [f32; 3],
}

impl From<&Triangle> for GpuTriangle {
    #[inline]
    fn from(tri: &Triangle) -> Self {
        Self {
            p0: tri.p0.to_array(),
            p1: tri.p1.to_array(),
            p2: tri.p2.to_array(),
            n0: tri.n0.to_array(),
            n1: tri.n1.to_array(),
            n2: tri.n2.to_array(),
        }
    }
}

impl GpuTriangle {
    pub fn to_triangle(&self) -> Triangle {
        Triangle::new(
            Vec3::from(self.p0).into(),
            Vec3::from(self.p1).into(),
            Vec3::from(self.p2).into(),
            Vec3::from(self.n0).into(),
            Vec3::from(self.n1).into(),
            Vec3::from(self.n2).into(),
        )
    }
}

/// Surface description of an instance. Copied to the GPU verbatim, never interpreted here.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub color: [f32; 4],
    pub emissive_color: [f32; 4],
    pub emissive_strength: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            emissive_color: [0.0, 0.0, 0.0, 1.0],
            emissive_strength: 0.0,
        }
    }
}

/// GPU instance (172 bytes). Matrices are column major.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuInstance {
    pub node_offset: u32,
    pub triangle_offset: u32,
    pub world_to_local: [f32; 16],
    pub local_to_world: [f32; 16],
    pub material: Material,
}

impl GpuInstance {
    pub fn new(
        node_offset: u32,
        triangle_offset: u32,
        world_to_local: &Mat4,
        local_to_world: &Mat4,
        material: Material,
    ) -> Self {
        Self {
            node_offset,
            triangle_offset,
            world_to_local: world_to_local.to_cols_array(),
            local_to_world: local_to_world.to_cols_array(),
            material,
        }
    }

    #[inline]
    pub fn world_to_local(&self) -> Mat4 {
        Mat4::from_cols_array(&self.world_to_local)
    }

    #[inline]
    pub fn local_to_world(&self) -> Mat4 {
        Mat4::from_cols_array(&self.local_to_world)
    }
}

/// Size in bytes of one record of a GPU buffer
#[inline]
pub const fn stride<T: Pod>() -> usize {
    std::mem::size_of::<T>()
}

/// Element count to allocate for a GPU buffer holding `len` records.
///
/// Structured buffers cannot be created empty, so an empty buffer still gets one element.
#[inline]
pub const fn upload_len(len: usize) -> usize {
    if len == 0 {
        1
    } else {
        len
    }
}

/// Flatten build nodes into wire records, index `i` maps to index `i`
pub fn gpu_nodes(nodes: &[BvhNode]) -> Vec<GpuBvhNode> {
    nodes.iter().map(GpuBvhNode::from).collect()
}

pub fn gpu_triangles(triangles: &[Triangle]) -> Vec<GpuTriangle> {
    triangles.iter().map(GpuTriangle::from).collect()
}

impl BvhTree {
    #[inline]
    pub fn gpu_nodes(&self) -> Vec<GpuBvhNode> {
        gpu_nodes(self.nodes())
    }

    #[inline]
    pub fn gpu_triangles(&self) -> Vec<GpuTriangle> {
        gpu_triangles(self.triangles())
    }
}
