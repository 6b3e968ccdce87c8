//! Maps the on-disk configuration onto the terrain and streamer parameters.

use glam::Vec3;
use loam_config::{BiomeEntry, Config};
use loam_lod::{LodBands, LodGridSizes};
use loam_stream::{RegionSettings, StreamerSettings, WorldSettings};
use loam_terrain::{
    BiomeDef, BiomeType, ColorLayer, HeightParams, RegionParams, SubBiome, TreeParams,
};
use tracing::warn;

/// Terrain inputs for `config`.
pub fn world_settings(config: &Config) -> WorldSettings {
    WorldSettings {
        seed: config.world.seed,
        height: height_params(config),
        regions: config.regions.enabled.then(|| region_settings(config)),
        color_layers: color_layers(config),
        color_variation: config.colors.variation_strength,
        trees: tree_params(config),
    }
}

/// Streaming inputs for `config`. Expects a validated config.
pub fn streamer_settings(config: &Config) -> StreamerSettings {
    let s = &config.streaming;
    StreamerSettings {
        chunk_world_size: config.world.chunk_world_size,
        max_render_distance: s.max_render_distance,
        bands: LodBands::new(s.high_distance, s.medium_distance),
        grid_sizes: LodGridSizes {
            high: s.high_grid_size as usize,
            medium: s.medium_grid_size as usize,
            low: s.low_grid_size as usize,
        },
        max_new_chunks_per_tick: s.max_new_chunks_per_tick,
        max_lod_updates_per_tick: s.max_lod_updates_per_tick,
        max_mesh_applies_per_tick: s.max_mesh_applies_per_tick,
        collider_delay_ticks: s.collider_delay_ticks as u64,
        worker_threads: s.worker_threads as usize,
    }
}

pub fn height_params(config: &Config) -> HeightParams {
    let t = &config.terrain;
    HeightParams {
        scale: t.scale,
        offset_x: t.offset_x,
        offset_z: t.offset_z,
        octaves: t.octaves,
        persistence: t.persistence,
        lacunarity: t.lacunarity,
        continent_frequency: t.continent_frequency,
        continent_low: t.continent_low,
        continent_high: t.continent_high,
        continent_height: t.continent_height,
        hills_frequency: t.hills_frequency,
        hills_amplitude: t.hills_amplitude,
        mountain_mask_frequency: t.mountain_mask_frequency,
        mountain_mask_low: t.mountain_mask_low,
        mountain_mask_high: t.mountain_mask_high,
        mountain_frequency: t.mountain_frequency,
        mountain_amplitude: t.mountain_amplitude,
        peak_mask_frequency: t.peak_mask_frequency,
        peak_mask_threshold: t.peak_mask_threshold,
        peak_mask_power: t.peak_mask_power,
        ridge_frequency: t.ridge_frequency,
        ridge_sharpness: t.ridge_sharpness,
        ridge_power: t.ridge_power,
        peak_amplitude: t.peak_amplitude,
        sea_level_offset: t.sea_level_offset,
        min_height: t.min_height,
    }
}

pub fn tree_params(config: &Config) -> TreeParams {
    let t = &config.trees;
    TreeParams {
        seed: t.seed,
        density: t.density,
        max_candidates: t.max_candidates,
        max_per_chunk: t.max_per_chunk,
        min_height: t.min_height,
        max_height: t.max_height,
        noise_scale: t.noise_scale,
        noise_threshold: t.noise_threshold,
        base_scale: t.base_scale,
        scale_variation: t.scale_variation,
        variant_count: t.variant_count,
    }
}

pub fn color_layers(config: &Config) -> Vec<ColorLayer> {
    config
        .colors
        .layers
        .iter()
        .map(|stop| ColorLayer {
            height: stop.height,
            color: Vec3::from_array(stop.color),
            weight: stop.weight,
        })
        .collect()
}

fn region_settings(config: &Config) -> RegionSettings {
    let r = &config.regions;
    RegionSettings {
        params: RegionParams {
            region_count: r.region_count as usize,
            world_extent: r.world_extent,
            min_seed_distance: r.min_seed_distance,
            max_placement_attempts: r.max_placement_attempts,
            blend_distance: r.blend_distance,
            boundary_noise_scale: r.boundary_noise_scale,
            boundary_noise_strength: r.boundary_noise_strength,
            sub_biome_noise_scale: r.sub_biome_noise_scale,
        },
        biomes: r.biomes.iter().filter_map(biome_def).collect(),
    }
}

/// Unknown biome names are skipped with a warning.
fn biome_def(entry: &BiomeEntry) -> Option<BiomeDef> {
    let Some(biome_type) = BiomeType::from_name(&entry.biome_type) else {
        warn!(name = %entry.biome_type, "Unknown biome type in config, skipping");
        return None;
    };
    let sub_biomes = entry
        .sub_biomes
        .iter()
        .map(|s| SubBiome {
            name: s.name.clone(),
            weight: s.weight,
            primary_color: Vec3::from_array(s.primary_color),
            secondary_color: Vec3::from_array(s.secondary_color),
            height_multiplier: s.height_multiplier,
            tree_probability: s.tree_probability.clamp(0.0, 1.0),
            water_allowed: s.water_allowed,
        })
        .collect();
    Some(BiomeDef {
        biome_type,
        sub_biomes,
    })
}
