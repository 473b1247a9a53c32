//! Publication of merged scene buffers.
//!
//! Readers get an [`Arc`] to an immutable snapshot. A model list change builds a complete new
//! snapshot and swaps it in, a published snapshot is never edited.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::{MeshLibrary, ModelInstance, Result, SceneAggregator, SceneBuffers, SceneConfig};

/// Immutable merged buffers tagged with the rebuild that produced them
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    /// Zero for the initial empty scene, incremented by every rebuild
    pub generation: u64,
    pub buffers: SceneBuffers,
}

#[derive(Debug)]
pub struct SceneManager {
    aggregator: SceneAggregator,
    current: RwLock<Arc<SceneSnapshot>>,
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::with_aggregator(SceneAggregator::default())
    }
}

impl SceneManager {
    pub fn new(config: SceneConfig) -> Result<Self> {
        Ok(Self::with_aggregator(SceneAggregator::new(config)?))
    }

    pub fn with_aggregator(aggregator: SceneAggregator) -> Self {
        Self {
            aggregator,
            current: RwLock::new(Arc::new(SceneSnapshot::default())),
        }
    }

    /// Latest published snapshot
    #[inline]
    pub fn snapshot(&self) -> Arc<SceneSnapshot> {
        self.current.read().clone()
    }

    /// Rebuild every buffer from the model list and publish the result.
    ///
    /// The build runs without holding the lock, readers keep seeing the previous snapshot
    /// until the new one is swapped in.
    pub fn update_models(&self, library: &MeshLibrary, models: &[ModelInstance]) -> Arc<SceneSnapshot> {
        let buffers = self.aggregator.aggregate(library, models);

        let mut current = self.current.write();
        let snapshot = Arc::new(SceneSnapshot {
            generation: current.generation + 1,
            buffers,
        });
        *current = snapshot.clone();

        tracing::debug!(generation = snapshot.generation, "published scene snapshot");

        snapshot
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::{Mat4, Vec3};

    use crate::*;

    fn triangle_mesh() -> Mesh {
        Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![0, 1, 2],
            vec![Vec3::Z; 3],
        )
    }

    #[test]
    fn starts_empty() {
        let manager = SceneManager::default();
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.buffers, SceneBuffers::default());
    }

    #[test]
    fn update_publishes_new_snapshot() {
        let manager =
            SceneManager::new(SceneConfig::default().with_bvh(BvhConfig::default().with_max_depth(2)))
                .unwrap();
        let mut library = MeshLibrary::new();
        let mesh = library.insert(triangle_mesh());

        let before = manager.snapshot();
        let models = [ModelInstance::new(mesh, Mat4::IDENTITY, Material::default())];
        let published = manager.update_models(&library, &models);

        assert_eq!(published.generation, 1);
        assert!(Arc::ptr_eq(&published, &manager.snapshot()));
        assert_eq!(published.buffers.instance_count(), 1);

        // old readers keep their snapshot untouched
        assert_eq!(before.generation, 0);
        assert_eq!(before.buffers.instance_count(), 0);

        let models = [
            ModelInstance::new(mesh, Mat4::IDENTITY, Material::default()),
            ModelInstance::new(mesh, Mat4::IDENTITY, Material::default()),
        ];
        let republished = manager.update_models(&library, &models);
        assert_eq!(republished.generation, 2);
        assert_eq!(republished.buffers.instance_count(), 2);
        assert_eq!(published.buffers.instance_count(), 1);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SceneConfig::default()
            .with_bvh(BvhConfig::default().with_max_depth(BvhConfig::MAX_SUPPORTED_DEPTH + 1));
        assert!(matches!(SceneManager::new(config), Err(Error::InvalidConfig(_))));
    }
}
