//! Build settings.

use crate::{Error, Result};

/// Settings of a single BVH build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BvhConfig {
    /// Depth of the leaves. The tree always holds `2^(max_depth + 1) - 1` nodes.
    pub max_depth: u32,
}

impl BvhConfig {
    pub const DEFAULT_MAX_DEPTH: u32 = 18;

    /// Deepest supported tree, 2^25 - 1 nodes
    pub const MAX_SUPPORTED_DEPTH: u32 = 24;

    #[inline]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Number of nodes of the complete tree
    #[inline]
    pub fn node_count(&self) -> usize {
        (1usize << (self.max_depth + 1)) - 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth > Self::MAX_SUPPORTED_DEPTH {
            return Err(Error::InvalidConfig(format!(
                "max_depth {} exceeds the supported maximum of {}",
                self.max_depth,
                Self::MAX_SUPPORTED_DEPTH
            )));
        }
        Ok(())
    }
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Settings of a whole scene aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SceneConfig {
    pub bvh: BvhConfig,
    /// Build the trees of distinct meshes on the rayon thread pool
    pub parallel_build: bool,
}

impl SceneConfig {
    #[inline]
    pub fn with_bvh(mut self, bvh: BvhConfig) -> Self {
        self.bvh = bvh;
        self
    }

    #[inline]
    pub fn with_parallel_build(mut self, parallel_build: bool) -> Self {
        self.parallel_build = parallel_build;
        self
    }

    #[inline]
    pub fn validate(&self) -> Result<()> {
        self.bvh.validate()
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            bvh: BvhConfig::default(),
            parallel_build: true,
        }
    }
}
