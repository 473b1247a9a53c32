//! Merging the trees of many meshes into global GPU buffers.
//!
//! Every unique mesh is built once. Its nodes and triangles are appended to the global buffers
//! in the order the mesh is first referenced, and each model instance records where its mesh
//! starts. Node children and triangle offsets stay local to their mesh, a consumer adds the
//! instance's `node_offset` / `triangle_offset` before indexing the global buffers.

use std::collections::HashMap;

use glam::Mat4;
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::{
    object_pool::{Handle, HandlePool},
    BoundingBox, BvhBuilder, BvhTree, Error, GpuBvhNode, GpuInstance, GpuTriangle, Material, Mesh,
    Result, SceneConfig,
};

pub type MeshHandle = Handle<Mesh>;

/// Meshes of a scene, addressed by stable handles
pub type MeshLibrary = HandlePool<Mesh>;

/// One placed model: which mesh, where, and with which material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInstance {
    pub mesh: Option<MeshHandle>,
    pub local_to_world: Mat4,
    pub world_to_local: Mat4,
    pub material: Material,
}

impl ModelInstance {
    pub fn new(mesh: MeshHandle, local_to_world: Mat4, material: Material) -> Self {
        Self {
            mesh: Some(mesh),
            local_to_world,
            world_to_local: local_to_world.inverse(),
            material,
        }
    }

    /// Instance whose mesh reference is missing. It is skipped and reported by the aggregator.
    pub fn without_mesh(local_to_world: Mat4, material: Material) -> Self {
        Self {
            mesh: None,
            local_to_world,
            world_to_local: local_to_world.inverse(),
            material,
        }
    }
}

/// Where a unique mesh landed in the global buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRecord {
    pub mesh: MeshHandle,
    pub node_offset: u32,
    pub triangle_offset: u32,
    pub node_count: u32,
    pub triangle_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshFailure {
    pub mesh: MeshHandle,
    pub error: Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedInstance {
    /// Position in the model list
    pub instance: usize,
    pub error: Error,
}

/// Everything that did not make it into the buffers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationReport {
    pub failed_meshes: SmallVec<[MeshFailure; 2]>,
    pub skipped_instances: SmallVec<[SkippedInstance; 4]>,
}

impl AggregationReport {
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failed_meshes.is_empty() && self.skipped_instances.is_empty()
    }
}

/// Merged buffers of a scene plus the bookkeeping needed to interpret them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBuffers {
    pub triangles: Vec<GpuTriangle>,
    pub nodes: Vec<GpuBvhNode>,
    /// One entry per resolved model instance, in model list order
    pub instances: Vec<GpuInstance>,
    /// World space bounds of each entry of `instances`
    pub instance_bounds: Vec<BoundingBox>,
    /// Model list position of each entry of `instances`
    pub instance_sources: Vec<usize>,
    /// Unique meshes in first seen order
    pub meshes: Vec<MeshRecord>,
    pub report: AggregationReport,
}

impl SceneBuffers {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn mesh_record(&self, mesh: &MeshHandle) -> Option<&MeshRecord> {
        self.meshes.iter().find(|record| record.mesh == *mesh)
    }

    /// Nodes of one mesh, still carrying mesh local indices
    pub fn mesh_nodes(&self, record: &MeshRecord) -> &[GpuBvhNode] {
        let first = record.node_offset as usize;
        &self.nodes[first..first + record.node_count as usize]
    }

    pub fn mesh_triangles(&self, record: &MeshRecord) -> &[GpuTriangle] {
        let first = record.triangle_offset as usize;
        &self.triangles[first..first + record.triangle_count as usize]
    }

    /// BVH nodes as bytes.
    pub fn nodes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Triangle data as bytes.
    pub fn triangles_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    /// Instance data as bytes.
    pub fn instances_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Builds one tree per unique mesh and merges them into [`SceneBuffers`]
#[derive(Debug, Clone, Copy)]
pub struct SceneAggregator {
    config: SceneConfig,
    builder: BvhBuilder,
}

impl Default for SceneAggregator {
    fn default() -> Self {
        Self {
            config: SceneConfig::default(),
            builder: BvhBuilder::default(),
        }
    }
}

/// Outcome of building one unique mesh
type BuiltMesh = Result<BvhTree>;

impl SceneAggregator {
    pub fn new(config: SceneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            builder: BvhBuilder::new(config.bvh)?,
        })
    }

    #[inline]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Merge the meshes referenced by `models` into global buffers.
    ///
    /// Never fails as a whole. Instances without a resolvable mesh and meshes that fail to
    /// build are left out and listed in [`SceneBuffers::report`].
    #[tracing::instrument(skip_all, fields(models = models.len(), parallel = self.config.parallel_build))]
    pub fn aggregate(&self, library: &MeshLibrary, models: &[ModelInstance]) -> SceneBuffers {
        let mut buffers = SceneBuffers::default();

        // Dedup: unique meshes in first seen order, and the slot every instance points at
        let mut slots: HashMap<MeshHandle, usize> = HashMap::new();
        let mut unique: Vec<(MeshHandle, &Mesh)> = Vec::new();
        let mut resolved: Vec<(usize, usize)> = Vec::with_capacity(models.len());

        for (instance, model) in models.iter().enumerate() {
            let Some(handle) = model.mesh else {
                skip_instance(&mut buffers, instance, Error::MissingMesh { instance });
                continue;
            };
            let Some(mesh) = library.get(&handle) else {
                skip_instance(&mut buffers, instance, Error::UnknownMesh { instance });
                continue;
            };
            let slot = *slots.entry(handle).or_insert_with(|| {
                unique.push((handle, mesh));
                unique.len() - 1
            });
            resolved.push((instance, slot));
        }

        let built = self.build_all(&unique);

        // Sequential merge keeps offsets independent of build scheduling
        let mut merged: Vec<Result<(MeshRecord, BoundingBox)>> = Vec::with_capacity(unique.len());
        for ((handle, _), tree) in unique.iter().zip(built) {
            let result = tree.and_then(|tree| append_tree(&mut buffers, *handle, &tree));
            if let Err(error) = &result {
                tracing::warn!(mesh = ?handle, %error, "mesh left out of the scene");
                buffers.report.failed_meshes.push(MeshFailure {
                    mesh: *handle,
                    error: error.clone(),
                });
            }
            merged.push(result);
        }

        for (instance, slot) in resolved {
            match &merged[slot] {
                Ok((record, bounds)) => {
                    let model = &models[instance];
                    buffers.instances.push(GpuInstance::new(
                        record.node_offset,
                        record.triangle_offset,
                        &model.world_to_local,
                        &model.local_to_world,
                        model.material,
                    ));
                    buffers
                        .instance_bounds
                        .push(bounds.transformed(&model.local_to_world));
                    buffers.instance_sources.push(instance);
                }
                Err(error) => skip_instance(&mut buffers, instance, error.clone()),
            }
        }

        tracing::info!(
            meshes = buffers.meshes.len(),
            instances = buffers.instances.len(),
            triangles = buffers.triangles.len(),
            nodes = buffers.nodes.len(),
            failed_meshes = buffers.report.failed_meshes.len(),
            skipped_instances = buffers.report.skipped_instances.len(),
            "scene aggregated"
        );

        buffers
    }

    /// Build every unique mesh. Output order matches input order whether or not the builds
    /// run in parallel.
    fn build_all(&self, unique: &[(MeshHandle, &Mesh)]) -> Vec<BuiltMesh> {
        let build = |(_, mesh): &(MeshHandle, &Mesh)| self.builder.build_mesh(mesh);
        if self.config.parallel_build {
            unique.par_iter().map(build).collect()
        } else {
            unique.iter().map(build).collect()
        }
    }
}

fn skip_instance(buffers: &mut SceneBuffers, instance: usize, error: Error) {
    tracing::warn!(instance, %error, "instance skipped");
    buffers
        .report
        .skipped_instances
        .push(SkippedInstance { instance, error });
}

/// Append one mesh's tree to the global buffers and record where it went
fn append_tree(
    buffers: &mut SceneBuffers,
    mesh: MeshHandle,
    tree: &BvhTree,
) -> Result<(MeshRecord, BoundingBox)> {
    let node_count = tree.nodes().len();
    let triangle_count = tree.triangles().len();

    let fits = |offset: usize, count: usize| {
        offset
            .checked_add(count)
            .is_some_and(|end| u32::try_from(end).is_ok())
    };
    if !fits(buffers.nodes.len(), node_count) {
        return Err(Error::OffsetOverflow { buffer: "node" });
    }
    if !fits(buffers.triangles.len(), triangle_count) {
        return Err(Error::OffsetOverflow { buffer: "triangle" });
    }

    let record = MeshRecord {
        mesh,
        node_offset: buffers.nodes.len() as u32,
        triangle_offset: buffers.triangles.len() as u32,
        node_count: node_count as u32,
        triangle_count: triangle_count as u32,
    };

    buffers.nodes.extend(tree.nodes().iter().map(GpuBvhNode::from));
    buffers
        .triangles
        .extend(tree.triangles().iter().map(GpuTriangle::from));
    buffers.meshes.push(record);

    Ok((record, tree.bounds()))
}
