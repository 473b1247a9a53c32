pub mod object_pool;

pub mod error;
pub use error::*;

pub mod config;
pub use config::*;

pub mod axis;
pub use axis::*;

pub mod triangle;
pub use triangle::*;

pub mod ray;
pub use ray::*;

pub mod aabb;
pub use aabb::*;

pub mod intersections;
pub use intersections::*;

pub mod mesh;
pub use mesh::*;

pub mod bvh_strategy;
pub use bvh_strategy::*;

pub mod bvh;
pub use bvh::*;

pub mod gpu_layout;
pub use gpu_layout::*;

pub mod scene;
pub use scene::*;

pub mod scene_manager;
pub use scene_manager::*;

pub mod traversal;
