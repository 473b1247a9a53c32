//! Error types for mesh extraction, BVH building and scene aggregation.

use thiserror::Error;

/// Ways raw mesh buffers can be malformed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// Index buffer does not describe whole triangles
    #[error("Index count {count} is not a multiple of 3")]
    IndexCountNotMultipleOfThree { count: usize },

    /// A triangle references a vertex that does not exist
    #[error("Triangle {triangle} references vertex {index} but the mesh has {vertex_count} vertices")]
    IndexOutOfBounds {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Every position needs exactly one normal
    #[error("Mesh has {positions} positions but {normals} normals")]
    NormalCountMismatch { positions: usize, normals: usize },

    /// Triangle count does not fit the 32 bit GPU records
    #[error("Mesh has {count} triangles, more than a 32 bit offset can address")]
    TooManyTriangles { count: usize },
}

/// Main error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed index, vertex or normal arrays
    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),

    /// A model instance carries no mesh reference
    #[error("Instance {instance} has no mesh")]
    MissingMesh { instance: usize },

    /// A model instance references a mesh that was removed from the library
    #[error("Instance {instance} references a mesh that is no longer in the library")]
    UnknownMesh { instance: usize },

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Global buffer grew past what a 32 bit offset can address
    #[error("Global {buffer} buffer overflows 32 bit offsets")]
    OffsetOverflow { buffer: &'static str },
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
