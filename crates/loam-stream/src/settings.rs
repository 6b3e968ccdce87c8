//! Construction parameters for [`ChunkStreamer`](crate::ChunkStreamer).

use loam_lod::{LodBands, LodGridSizes};
use loam_terrain::{BiomeDef, ColorLayer, HeightParams, RegionParams, TreeParams};

/// Streaming behaviour: distances, resolutions, and per-tick budgets.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamerSettings {
    /// World units covered by one chunk side.
    pub chunk_world_size: f64,
    /// Chebyshev radius, in chunks, of the live set around the viewer.
    pub max_render_distance: u32,
    pub bands: LodBands,
    pub grid_sizes: LodGridSizes,
    pub max_new_chunks_per_tick: u32,
    pub max_lod_updates_per_tick: u32,
    pub max_mesh_applies_per_tick: u32,
    /// Ticks between a High mesh being applied and its collider step.
    pub collider_delay_ticks: u64,
    /// Generation threads; 0 picks a count from the CPU.
    pub worker_threads: usize,
}

impl Default for StreamerSettings {
    fn default() -> Self {
        Self {
            chunk_world_size: 120.0,
            max_render_distance: 6,
            bands: LodBands::default(),
            grid_sizes: LodGridSizes::default(),
            max_new_chunks_per_tick: 4,
            max_lod_updates_per_tick: 2,
            max_mesh_applies_per_tick: 3,
            collider_delay_ticks: 3,
            worker_threads: 0,
        }
    }
}

/// Region layout inputs. Leaving this out of [`WorldSettings`] runs the
/// streamer on the fallback biome blend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionSettings {
    pub params: RegionParams,
    /// Biomes to distribute; empty means the built-in set.
    pub biomes: Vec<BiomeDef>,
}

/// Everything that defines what the terrain looks like for one world.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldSettings {
    pub seed: u64,
    pub height: HeightParams,
    pub regions: Option<RegionSettings>,
    pub color_layers: Vec<ColorLayer>,
    pub color_variation: f32,
    pub trees: TreeParams,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            height: HeightParams::default(),
            regions: Some(RegionSettings::default()),
            color_layers: Vec::new(),
            color_variation: 0.06,
            trees: TreeParams::default(),
        }
    }
}
