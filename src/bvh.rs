extern crate glam;
use glam::Vec3A;

use std::marker::PhantomData;
use std::ops::Range;

use crate::{
    BoundingBox, BvhConfig, Mesh, MeshError, Result, SpatialMedianStrategy, SplitPlane,
    SplitPlaneStrategy, Triangle,
};

/// Node of a fixed depth BVH.
///
/// Nodes live in a complete binary tree addressed implicitly: the children of node `i` are
/// `2i + 1` and `2i + 2`. Node 0 is the root, so a child index of 0 means "no child".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BvhNode {
    pub bounds: BoundingBox,
    pub child1: u32,
    pub child2: u32,
    pub triangle_offset: u32,
    pub triangle_count: u32,
    /// Only used for inspection, never sent to the GPU
    pub depth: u32,
}

impl BvhNode {
    pub const NO_CHILD: u32 = 0;

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child1 == Self::NO_CHILD
    }

    /// Triangles owned by this node's subtree
    #[inline]
    pub fn triangle_range(&self) -> Range<usize> {
        let first = self.triangle_offset as usize;
        first..first + self.triangle_count as usize
    }
}

/// Per triangle data computed once before the build
#[derive(Debug, Clone, Copy)]
struct BuildPrimitive {
    centroid: Vec3A,
    min: Vec3A,
    max: Vec3A,
    source_index: u32,
}

/// Built hierarchy of one mesh: the node array plus the triangles in leaf order
#[derive(Debug, Clone, Default)]
pub struct BvhTree {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
    source_indices: Vec<u32>,
    max_depth: u32,
}

impl BvhTree {
    #[inline]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Input triangles reordered so every node owns a contiguous range
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Position each reordered triangle had in the input array
    #[inline]
    pub fn source_indices(&self) -> &[u32] {
        &self.source_indices
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline]
    pub fn root(&self) -> &BvhNode {
        &self.nodes[0]
    }

    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        self.root().bounds
    }

    /// Nodes at one level of the tree, with their index. The leaves sit at `max_depth`.
    pub fn nodes_at_depth(&self, depth: u32) -> impl Iterator<Item = (usize, &BvhNode)> {
        // level d occupies [2^d - 1, 2^(d+1) - 1)
        let range = if depth > self.max_depth {
            0..0
        } else {
            let first = (1usize << depth) - 1;
            first..(first * 2 + 1)
        };
        range.map(move |i| (i, &self.nodes[i]))
    }

    #[inline]
    pub fn leaves(&self) -> impl Iterator<Item = (usize, &BvhNode)> {
        self.nodes_at_depth(self.max_depth)
    }

    pub fn into_triangles(self) -> Vec<Triangle> {
        self.triangles
    }
}

/// Builds fixed depth trees. The split plane of every node comes from `Strat`.
#[derive(Debug, Clone, Copy)]
pub struct BvhBuilder<Strat = SpatialMedianStrategy> {
    config: BvhConfig,
    strategy: PhantomData<Strat>,
}

impl Default for BvhBuilder {
    fn default() -> Self {
        Self {
            config: BvhConfig::default(),
            strategy: PhantomData,
        }
    }
}

impl<Strat> BvhBuilder<Strat>
where
    Strat: SplitPlaneStrategy,
{
    pub fn new(config: BvhConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            strategy: PhantomData,
        })
    }

    #[inline]
    pub fn config(&self) -> &BvhConfig {
        &self.config
    }

    /// Extract the triangles of a mesh and build over them, rooted at the mesh bounds
    pub fn build_mesh(&self, mesh: &Mesh) -> Result<BvhTree> {
        let triangles = mesh.triangles()?;
        self.build(triangles, mesh.bounds)
    }

    /// Build a tree over `triangles`.
    ///
    /// `bounds` becomes the root box as is and must enclose every triangle. The triangles are
    /// reordered in place and stored in the tree.
    #[tracing::instrument(skip_all, fields(triangles = triangles.len(), max_depth = self.config.max_depth))]
    pub fn build(&self, triangles: Vec<Triangle>, bounds: BoundingBox) -> Result<BvhTree> {
        let tri_count = u32::try_from(triangles.len()).map_err(|_| MeshError::TooManyTriangles {
            count: triangles.len(),
        })?;

        let primitives = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| BuildPrimitive {
                centroid: tri.centroid(),
                min: tri.min(),
                max: tri.max(),
                source_index: i as u32,
            })
            .collect();

        let mut nodes = vec![BvhNode::default(); self.config.node_count()];
        nodes[0] = BvhNode {
            bounds,
            triangle_offset: 0,
            triangle_count: tri_count,
            ..Default::default()
        };

        let mut state = BuildState {
            nodes,
            triangles,
            primitives,
            max_depth: self.config.max_depth,
        };
        state.split::<Strat>(0, 0);

        let BuildState {
            nodes,
            triangles,
            primitives,
            max_depth,
        } = state;

        let tree = BvhTree {
            nodes,
            triangles,
            source_indices: primitives.iter().map(|prim| prim.source_index).collect(),
            max_depth,
        };

        tracing::debug!(
            nodes = tree.nodes.len(),
            occupied_leaves = tree.leaves().filter(|(_, leaf)| leaf.triangle_count > 0).count(),
            largest_leaf = tree.leaves().map(|(_, leaf)| leaf.triangle_count).max().unwrap_or(0),
            "built bvh"
        );

        Ok(tree)
    }
}

/// Arrays exclusively owned by one build. Recursion only passes node indices around.
struct BuildState {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
    primitives: Vec<BuildPrimitive>,
    max_depth: u32,
}

impl BuildState {
    fn split<Strat>(&mut self, node_id: usize, depth: u32)
    where
        Strat: SplitPlaneStrategy,
    {
        self.nodes[node_id].depth = depth;
        if depth == self.max_depth {
            return;
        }

        let node = self.nodes[node_id];
        let SplitPlane {
            axis,
            split_position,
        } = Strat::get_split_plane(&node.bounds);

        let range = node.triangle_range();
        let mid = self.partition(range.clone(), |prim| prim.centroid[axis] < split_position);

        let child1_id = node_id * 2 + 1;
        let child2_id = node_id * 2 + 2;

        self.nodes[child1_id] = BvhNode {
            bounds: self.range_bounds(range.start..mid),
            triangle_offset: range.start as u32,
            triangle_count: (mid - range.start) as u32,
            ..Default::default()
        };
        self.nodes[child2_id] = BvhNode {
            bounds: self.range_bounds(mid..range.end),
            triangle_offset: mid as u32,
            triangle_count: (range.end - mid) as u32,
            ..Default::default()
        };

        let node = &mut self.nodes[node_id];
        node.child1 = child1_id as u32;
        node.child2 = child2_id as u32;

        // an empty child still gets its full subtree
        self.split::<Strat>(child1_id, depth + 1);
        self.split::<Strat>(child2_id, depth + 1);
    }

    /// Swap based partition of a triangle range. Returns the first index of the second half.
    fn partition<F>(&mut self, range: Range<usize>, goes_first: F) -> usize
    where
        F: Fn(&BuildPrimitive) -> bool,
    {
        let mut i = range.start;
        let mut j = range.end;
        while i < j {
            if goes_first(&self.primitives[i]) {
                i += 1;
            } else {
                j -= 1;
                self.primitives.swap(i, j);
                self.triangles.swap(i, j);
            }
        }
        i
    }

    /// Box around the triangle extents of a range, empty for an empty range
    fn range_bounds(&self, range: Range<usize>) -> BoundingBox {
        let mut bounds = BoundingBox::EMPTY;
        for prim in &self.primitives[range] {
            bounds.grow_min_max(prim.min, prim.max);
        }
        bounds
    }
}

#[cfg(test)]
mod tests {

    use std::iter;

    use rand::{thread_rng, Rng};

    use glam::{Vec3, Vec3A};

    use crate::*;

    static TRIANGLES_NUM: usize = 256;

    fn random_triangles(count: usize) -> Vec<Triangle> {
        let mut rng = thread_rng();
        iter::repeat(0)
            .take(count)
            .map(|_| {
                let v0 = rng.gen::<Vec3A>() * 9.0 - Vec3A::splat(5.0);
                let v1 = v0 + rng.gen::<Vec3A>();
                let v2 = v0 + rng.gen::<Vec3A>();
                Triangle::from_positions(v0, v1, v2)
            })
            .collect()
    }

    fn build(triangles: Vec<Triangle>, max_depth: u32) -> BvhTree {
        let bounds = BoundingBox::from_items(&triangles);
        let builder: BvhBuilder =
            BvhBuilder::new(BvhConfig::default().with_max_depth(max_depth)).unwrap();
        builder.build(triangles, bounds).unwrap()
    }

    fn internal_nodes(tree: &BvhTree) -> impl Iterator<Item = &BvhNode> {
        tree.nodes().iter().filter(|node| !node.is_leaf())
    }

    #[test]
    fn node_array_has_fixed_length() {
        for max_depth in 0..8 {
            let expected = (1 << (max_depth + 1)) - 1;
            assert_eq!(build(vec![], max_depth).nodes().len(), expected);
            assert_eq!(build(random_triangles(3), max_depth).nodes().len(), expected);
            assert_eq!(
                build(random_triangles(TRIANGLES_NUM), max_depth).nodes().len(),
                expected
            );
        }
    }

    #[test]
    fn children_counts_sum_to_parent() {
        let tree = build(random_triangles(TRIANGLES_NUM), 6);
        let nodes = tree.nodes();
        assert_eq!(tree.root().triangle_count as usize, TRIANGLES_NUM);

        for node in internal_nodes(&tree) {
            let child1 = &nodes[node.child1 as usize];
            let child2 = &nodes[node.child2 as usize];
            assert_eq!(child1.triangle_count + child2.triangle_count, node.triangle_count);
            // [child1][child2] laid out back to back inside the parent range
            assert_eq!(child1.triangle_offset, node.triangle_offset);
            assert_eq!(child2.triangle_offset, child1.triangle_offset + child1.triangle_count);
        }
    }

    #[test]
    fn parent_bounds_contain_children() {
        let tree = build(random_triangles(TRIANGLES_NUM), 6);
        let nodes = tree.nodes();

        for node in internal_nodes(&tree) {
            assert!(node.bounds.contains(&nodes[node.child1 as usize].bounds));
            assert!(node.bounds.contains(&nodes[node.child2 as usize].bounds));
        }
    }

    #[test]
    fn node_bounds_contain_owned_triangles() {
        let tree = build(random_triangles(TRIANGLES_NUM), 5);
        for node in tree.nodes() {
            for tri in &tree.triangles()[node.triangle_range()] {
                let mut tri_bounds = BoundingBox::EMPTY;
                tri_bounds.grow(tri);
                assert!(node.bounds.contains(&tri_bounds));
            }
        }
    }

    #[test]
    fn children_follow_split_plane() {
        let tree = build(random_triangles(TRIANGLES_NUM), 4);
        let nodes = tree.nodes();

        for node in internal_nodes(&tree) {
            let plane = SpatialMedianStrategy::get_split_plane(&node.bounds);
            let child1 = &nodes[node.child1 as usize];
            let child2 = &nodes[node.child2 as usize];
            for tri in &tree.triangles()[child1.triangle_range()] {
                assert!(tri.centroid()[plane.axis] < plane.split_position);
            }
            for tri in &tree.triangles()[child2.triangle_range()] {
                assert!(tri.centroid()[plane.axis] >= plane.split_position);
            }
        }
    }

    #[test]
    fn triangles_are_a_permutation() {
        let input = random_triangles(TRIANGLES_NUM);
        let tree = build(input.clone(), 7);

        assert_eq!(tree.triangles().len(), input.len());

        let mut seen = vec![false; input.len()];
        for (slot, &source) in tree.source_indices().iter().enumerate() {
            assert!(!seen[source as usize], "triangle {source} duplicated");
            seen[source as usize] = true;
            assert_eq!(tree.triangles()[slot], input[source as usize]);
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn leaves_tile_the_triangle_array() {
        let tree = build(random_triangles(TRIANGLES_NUM), 5);
        let mut next = 0;
        for (_, leaf) in tree.leaves() {
            assert!(leaf.is_leaf());
            assert_eq!(leaf.triangle_offset, next);
            next += leaf.triangle_count;
        }
        assert_eq!(next as usize, TRIANGLES_NUM);
    }

    #[test]
    fn depth_and_children_follow_implicit_layout() {
        let tree = build(random_triangles(32), 4);
        for depth in 0..=tree.max_depth() {
            for (i, node) in tree.nodes_at_depth(depth) {
                assert_eq!(node.depth, depth);
                if depth < tree.max_depth() {
                    assert_eq!(node.child1 as usize, 2 * i + 1);
                    assert_eq!(node.child2 as usize, 2 * i + 2);
                } else {
                    assert_eq!(node.child1, BvhNode::NO_CHILD);
                    assert_eq!(node.child2, BvhNode::NO_CHILD);
                }
            }
        }
        assert_eq!(tree.nodes_at_depth(tree.max_depth() + 1).count(), 0);
        assert_eq!(tree.leaves().count(), 16);
    }

    #[test]
    fn single_triangle_goes_down_one_path() {
        let tri = Triangle::from_positions(
            Vec3A::new(0.0, 0.0, 0.0),
            Vec3A::new(1.0, 0.0, 0.0),
            Vec3A::new(0.0, 1.0, 0.0),
        );
        let tree = build(vec![tri], 2);
        let nodes = tree.nodes();

        assert_eq!(nodes.len(), 7);
        assert_eq!(tree.root().triangle_count, 1);

        let tri_bounds = BoundingBox::from_items(&[tri]);

        let mut node_id = 0;
        for _ in 0..2 {
            let node = &nodes[node_id];
            assert_eq!(node.triangle_count, 1);
            assert_eq!(node.bounds, tri_bounds);

            let child1 = &nodes[node.child1 as usize];
            let child2 = &nodes[node.child2 as usize];
            let (taken, discarded) = if child1.triangle_count == 1 {
                (node.child1, child2)
            } else {
                (node.child2, child1)
            };
            assert_eq!(discarded.triangle_count, 0);
            assert!(discarded.bounds.is_empty());
            node_id = taken as usize;
        }

        assert_eq!(nodes[node_id].bounds, tri_bounds);
        assert_eq!(
            tree.leaves().filter(|(_, leaf)| leaf.triangle_count == 1).count(),
            1
        );
        assert_eq!(
            tree.leaves().filter(|(_, leaf)| leaf.triangle_count == 0).count(),
            3
        );
    }

    #[test]
    fn empty_input_is_a_valid_tree() {
        let bounds = BoundingBox::new(Vec3A::ZERO, Vec3A::ONE);
        let builder: BvhBuilder = BvhBuilder::default();
        let tree = builder.build(vec![], bounds).unwrap();

        assert_eq!(tree.nodes().len(), BvhConfig::default().node_count());
        assert_eq!(tree.root().triangle_count, 0);
        assert_eq!(tree.bounds(), bounds);
        assert!(tree.nodes().iter().all(|node| node.triangle_count == 0));
        assert!(tree.triangles().is_empty());
    }

    #[test]
    fn identical_centroids_end_up_in_one_leaf() {
        let tri = Triangle::from_positions(Vec3A::ZERO, Vec3A::X, Vec3A::Y);
        let tree = build(vec![tri; 10], 3);

        let occupied: Vec<_> = tree
            .leaves()
            .filter(|(_, leaf)| leaf.triangle_count > 0)
            .collect();
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied[0].1.triangle_count, 10);
    }

    #[test]
    fn root_keeps_supplied_bounds() {
        let triangles = random_triangles(16);
        let bounds = BoundingBox::new(Vec3A::splat(-100.0), Vec3A::splat(100.0));
        let builder: BvhBuilder = BvhBuilder::default();
        let tree = builder.build(triangles, bounds).unwrap();
        assert_eq!(tree.bounds(), bounds);
    }

    #[test]
    fn invalid_mesh_fails_before_building() {
        let mesh = Mesh::new(vec![Vec3::ZERO; 3], vec![0, 1, 3], vec![Vec3::Z; 3]);
        let builder: BvhBuilder = BvhBuilder::default();
        assert!(matches!(
            builder.build_mesh(&mesh),
            Err(Error::InvalidMesh(MeshError::IndexOutOfBounds { .. }))
        ));
    }
}
