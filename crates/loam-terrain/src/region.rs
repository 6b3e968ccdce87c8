//! Region partition: weighted Voronoi-like biome zones with blended
//! boundaries, plus the temperature/moisture fallback.

mod def;
mod defaults;
mod fallback;
mod layout;
mod map;
mod snapshot;
mod source;

pub use def::{BiomeDef, BiomeType, Region, SubBiome};
pub use defaults::{default_biomes, default_sub_biomes};
pub use fallback::{FallbackBiomes, FallbackWeights};
pub use map::RegionMap;
pub use snapshot::{BlendedAttributes, RegionParams, RegionQuery, RegionSnapshot, blend_factor};
pub use source::{BiomeSample, BiomeSource, SampleOrigin};
