//! Procedural terrain synthesis: layered-noise heights, biome regions with
//! blended boundaries, per-vertex coloring, height sample grids, and tree
//! scattering.

mod color;
mod grid;
mod heightfield;
mod noise_field;
mod seed;
mod trees;

pub mod region;

pub use color::{ColorCompositor, ColorLayer};
pub use grid::{HeightGrid, terrain_height};
pub use heightfield::{HeightFieldGenerator, HeightLayers, HeightParams, smoothstep};
pub use noise_field::NoiseField;
pub use region::{
    BiomeDef, BiomeSample, BiomeSource, BiomeType, FallbackBiomes, RegionMap, RegionParams,
    RegionQuery, RegionSnapshot, SubBiome,
};
pub use seed::{chunk_rng, derive_chunk_seed, det_sin, position_hash};
pub use trees::{ChunkTrees, TreeParams, TreePlacement, TreeScatterer};
