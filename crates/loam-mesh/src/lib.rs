//! Terrain meshing: flat-shaded and indexed heightfield triangulation and the
//! background chunk generation pipeline.

pub mod builder;
pub mod mesh_data;
pub mod pipeline;

pub use builder::{MeshBuilder, quad_triangles};
pub use mesh_data::{MeshData, MeshError, Shading};
pub use pipeline::{
    GenerationPipeline, GenerationResult, GenerationTask, default_worker_count, generate_chunk,
};
