//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level terrain configuration bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// World seed and chunk grid geometry.
    pub world: WorldConfig,
    /// Height synthesis noise parameters.
    pub terrain: TerrainConfig,
    /// Region (biome partition) settings.
    pub regions: RegionConfig,
    /// Chunk streaming, LOD bands and per-tick budgets.
    pub streaming: StreamingConfig,
    /// Vegetation scattering.
    pub trees: TreeConfig,
    /// Height color layers and variation.
    pub colors: ColorConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World seed and chunk geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for every noise layer and the region layout.
    pub seed: u64,
    /// Edge length of one chunk in world units.
    pub chunk_world_size: f64,
}

/// Layered-noise height parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// World units per noise unit. World coordinates are divided by this.
    pub scale: f64,
    /// World-space offset added to X before scaling.
    pub offset_x: f64,
    /// World-space offset added to Z before scaling.
    pub offset_z: f64,
    /// Octave count for the mountain fBm.
    pub octaves: u32,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Continent mask frequency.
    pub continent_frequency: f64,
    /// Lower smoothstep edge of the continent mask.
    pub continent_low: f64,
    /// Upper smoothstep edge of the continent mask.
    pub continent_high: f64,
    /// Height added at full continent influence.
    pub continent_height: f64,
    /// Base frequency of the rolling hills.
    pub hills_frequency: f64,
    /// Amplitude of the first hills octave.
    pub hills_amplitude: f64,
    /// Frequency of the mountain mask.
    pub mountain_mask_frequency: f64,
    /// Lower smoothstep edge of the mountain mask.
    pub mountain_mask_low: f64,
    /// Upper smoothstep edge of the mountain mask.
    pub mountain_mask_high: f64,
    /// Base frequency of the mountain fBm.
    pub mountain_frequency: f64,
    /// Amplitude of the first mountain octave.
    pub mountain_amplitude: f64,
    /// Frequency of the sparse peak mask.
    pub peak_mask_frequency: f64,
    /// Peak mask threshold; peaks only appear above it.
    pub peak_mask_threshold: f64,
    /// Exponent applied to the peak mask above the threshold.
    pub peak_mask_power: f64,
    /// Frequency of the ridge noise.
    pub ridge_frequency: f64,
    /// Blend from smoothed (0.0) to raw (1.0) ridge profile.
    pub ridge_sharpness: f64,
    /// Exponent applied to the ridge profile.
    pub ridge_power: f64,
    /// Height of a fully masked peak.
    pub peak_amplitude: f64,
    /// Constant added to every height.
    pub sea_level_offset: f64,
    /// Floor clamp for the final height.
    pub min_height: f64,
}

/// One sub-biome entry of a configured biome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SubBiomeEntry {
    /// Display name.
    pub name: String,
    /// Relative selection weight inside the region.
    pub weight: f32,
    /// Low-altitude color (linear RGB).
    pub primary_color: [f32; 3],
    /// High-altitude color (linear RGB).
    pub secondary_color: [f32; 3],
    /// Multiplier applied to the synthesized height.
    pub height_multiplier: f32,
    /// Probability that an eligible tree candidate is accepted.
    pub tree_probability: f32,
    /// Whether standing water may appear.
    pub water_allowed: bool,
}

/// A configured biome: a type name plus its weighted sub-biomes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BiomeEntry {
    /// Biome type name (`temperate`, `desert`, `tundra`, `tropical`, `alpine`).
    pub biome_type: String,
    /// Weighted variants.
    pub sub_biomes: Vec<SubBiomeEntry>,
}

/// Region partition settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionConfig {
    /// When false, biomes come from the temperature/moisture fallback.
    pub enabled: bool,
    /// Number of region seed points.
    pub region_count: u32,
    /// Seeds are placed in `[-world_extent, world_extent]` on both axes.
    pub world_extent: f64,
    /// Minimum spacing between region seeds.
    pub min_seed_distance: f64,
    /// Rejection-sampling attempts per seed.
    pub max_placement_attempts: u32,
    /// Width of the blend band around region boundaries.
    pub blend_distance: f64,
    /// Frequency of the boundary distortion noise.
    pub boundary_noise_scale: f64,
    /// Maximum boundary displacement in world units.
    pub boundary_noise_strength: f64,
    /// Frequency of the sub-biome selection noise.
    pub sub_biome_noise_scale: f64,
    /// Configured biomes. Empty means "use the built-in set".
    pub biomes: Vec<BiomeEntry>,
}

/// Chunk streaming settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Samples per side at High LOD.
    pub high_grid_size: u32,
    /// Samples per side at Medium LOD.
    pub medium_grid_size: u32,
    /// Samples per side at Low LOD.
    pub low_grid_size: u32,
    /// Chebyshev radius (in chunks) of the streamed area.
    pub max_render_distance: u32,
    /// Chunks at or within this distance use High LOD.
    pub high_distance: u32,
    /// Chunks at or within this distance use Medium LOD.
    pub medium_distance: u32,
    /// Creation requests dispatched per tick.
    pub max_new_chunks_per_tick: u32,
    /// LOD change requests dispatched per tick.
    pub max_lod_updates_per_tick: u32,
    /// Completed meshes applied per tick.
    pub max_mesh_applies_per_tick: u32,
    /// Ticks between High LOD mesh assignment and collider finalization.
    pub collider_delay_ticks: u32,
    /// Worker threads for chunk generation (0 = based on CPU count).
    pub worker_threads: u32,
}

/// Tree scattering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreeConfig {
    /// Global tree seed, mixed with each chunk coordinate.
    pub seed: u64,
    /// Candidates per square world unit.
    pub density: f64,
    /// Upper bound on candidates per chunk.
    pub max_candidates: u32,
    /// Hard cap on placements per chunk.
    pub max_per_chunk: u32,
    /// Lowest normalized height that accepts trees.
    pub min_height: f32,
    /// Highest normalized height that accepts trees.
    pub max_height: f32,
    /// Frequency of the tree clustering noise.
    pub noise_scale: f64,
    /// Candidates are rejected where the clustering noise is below this.
    pub noise_threshold: f64,
    /// Mean uniform scale.
    pub base_scale: f32,
    /// Relative scale variation (0.2 = +-20%).
    pub scale_variation: f32,
    /// Number of tree prefab variants.
    pub variant_count: u8,
}

/// A height color stop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColorStop {
    /// Normalized height in `[0, 1]`.
    pub height: f32,
    /// Linear RGB.
    pub color: [f32; 3],
    /// How strongly this layer overrides the biome color.
    pub weight: f32,
}

/// Color layer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColorConfig {
    /// Stops ordered by height.
    pub layers: Vec<ColorStop>,
    /// Maximum brightness/saturation perturbation from the position hash.
    pub variation_strength: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log one line per streamer tick.
    pub log_ticks: bool,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            chunk_world_size: 120.0,
        }
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            scale: 10.0,
            offset_x: 0.0,
            offset_z: 0.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            continent_frequency: 0.002,
            continent_low: 0.35,
            continent_high: 0.6,
            continent_height: 12.0,
            hills_frequency: 0.08,
            hills_amplitude: 6.0,
            mountain_mask_frequency: 0.006,
            mountain_mask_low: 0.45,
            mountain_mask_high: 0.7,
            mountain_frequency: 0.03,
            mountain_amplitude: 28.0,
            peak_mask_frequency: 0.004,
            peak_mask_threshold: 0.68,
            peak_mask_power: 1.5,
            ridge_frequency: 0.025,
            ridge_sharpness: 0.6,
            ridge_power: 2.0,
            peak_amplitude: 80.0,
            sea_level_offset: -8.0,
            min_height: -12.0,
        }
    }
}

impl Default for SubBiomeEntry {
    fn default() -> Self {
        Self {
            name: String::new(),
            weight: 1.0,
            primary_color: [0.3, 0.5, 0.2],
            secondary_color: [0.45, 0.4, 0.3],
            height_multiplier: 1.0,
            tree_probability: 0.3,
            water_allowed: true,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            region_count: 24,
            world_extent: 6000.0,
            min_seed_distance: 900.0,
            max_placement_attempts: 30,
            blend_distance: 120.0,
            boundary_noise_scale: 0.004,
            boundary_noise_strength: 150.0,
            sub_biome_noise_scale: 0.003,
            biomes: Vec::new(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            high_grid_size: 121,
            medium_grid_size: 61,
            low_grid_size: 31,
            max_render_distance: 6,
            high_distance: 1,
            medium_distance: 3,
            max_new_chunks_per_tick: 4,
            max_lod_updates_per_tick: 2,
            max_mesh_applies_per_tick: 3,
            collider_delay_ticks: 3,
            worker_threads: 0,
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            seed: 7,
            density: 0.01,
            max_candidates: 400,
            max_per_chunk: 80,
            min_height: 0.12,
            max_height: 0.55,
            noise_scale: 0.02,
            noise_threshold: 0.4,
            base_scale: 1.0,
            scale_variation: 0.25,
            variant_count: 3,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            layers: vec![
                ColorStop {
                    height: 0.0,
                    color: [0.12, 0.25, 0.45],
                    weight: 1.0,
                },
                ColorStop {
                    height: 0.06,
                    color: [0.76, 0.7, 0.5],
                    weight: 0.8,
                },
                ColorStop {
                    height: 0.12,
                    color: [0.35, 0.55, 0.25],
                    weight: 0.0,
                },
                ColorStop {
                    height: 0.6,
                    color: [0.45, 0.42, 0.4],
                    weight: 0.3,
                },
                ColorStop {
                    height: 0.8,
                    color: [0.5, 0.48, 0.46],
                    weight: 0.9,
                },
                ColorStop {
                    height: 0.92,
                    color: [0.95, 0.95, 0.97],
                    weight: 1.0,
                },
            ],
            variation_strength: 0.06,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_ticks: false,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Default per-user configuration directory (`<config_dir>/loam`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("loam"))
    }

    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("terrain.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `terrain.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("terrain.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Checks the invariants the streamer and mesh builders rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if !(self.world.chunk_world_size > 0.0) {
            return Err(invalid("world.chunk_world_size", "must be positive"));
        }
        if !(self.terrain.scale > 0.0) {
            return Err(invalid("terrain.scale", "must be positive"));
        }
        let s = &self.streaming;
        for (field, size) in [
            ("streaming.high_grid_size", s.high_grid_size),
            ("streaming.medium_grid_size", s.medium_grid_size),
            ("streaming.low_grid_size", s.low_grid_size),
        ] {
            if size < 2 {
                return Err(invalid(field, format!("{size} samples cannot form a quad")));
            }
        }
        if s.high_distance > s.medium_distance {
            return Err(invalid(
                "streaming.high_distance",
                format!(
                    "{} exceeds medium_distance {}",
                    s.high_distance, s.medium_distance
                ),
            ));
        }
        if self.trees.min_height > self.trees.max_height {
            return Err(invalid("trees.min_height", "exceeds trees.max_height"));
        }
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("terrain.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
