use crate::{Axis, BoundingBox};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlane {
    pub axis: Axis,
    pub split_position: f32,
}

impl Default for SplitPlane {
    fn default() -> Self {
        Self {
            axis: Axis::X,
            split_position: 0.0,
        }
    }
}

pub trait SplitPlaneStrategy {
    /// Get the plane a node with these bounds is divided by.
    ///
    /// The fixed depth tree splits every node above the leaf level, so a strategy always has
    /// to answer, even for an empty node.
    fn get_split_plane(bounds: &BoundingBox) -> SplitPlane;
}

/// Midpoint of the longest axis of the node bounds, independent of where the triangles are
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialMedianStrategy {}

impl SplitPlaneStrategy for SpatialMedianStrategy {
    #[inline(always)]
    fn get_split_plane(bounds: &BoundingBox) -> SplitPlane {
        let axis = Axis::longest(bounds.extent());
        SplitPlane {
            axis,
            split_position: bounds.center()[axis],
        }
    }
}
