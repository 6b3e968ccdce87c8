//! The live region store: generates regions and publishes snapshots.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::def::BiomeDef;
use super::defaults::{default_biomes, default_sub_biomes};
use super::layout::{assign_biomes, place_seed_points};
use super::snapshot::{RegionParams, RegionQuery, RegionSnapshot};

/// Owns the current [`RegionSnapshot`] for a world.
///
/// Readers take an `Arc` to the current snapshot and never block the
/// generator. [`rebuild`](Self::rebuild) builds a complete new snapshot and
/// then swaps the pointer, so tasks still holding the previous snapshot
/// finish against consistent data.
#[derive(Debug)]
pub struct RegionMap {
    params: RegionParams,
    biomes: Vec<BiomeDef>,
    current: RwLock<Arc<RegionSnapshot>>,
}

impl RegionMap {
    /// Generates regions for `seed`.
    ///
    /// An empty `biomes` list is a configuration gap, not an error: the
    /// built-in set is used instead. Biomes configured without sub-biomes
    /// receive their type's defaults.
    pub fn generate(seed: u64, params: RegionParams, biomes: Vec<BiomeDef>) -> Self {
        let biomes = sanitize_biomes(biomes);
        let snapshot = build_snapshot(seed, &params, &biomes);
        Self {
            params,
            biomes,
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<RegionSnapshot> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Regenerates every region for `seed` and publishes the result.
    pub fn rebuild(&self, seed: u64) -> Arc<RegionSnapshot> {
        let snapshot = Arc::new(build_snapshot(seed, &self.params, &self.biomes));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);
        info!(seed, regions = snapshot.regions().len(), "Region snapshot rebuilt");
        snapshot
    }

    /// Convenience query against the current snapshot.
    pub fn query(&self, world_x: f64, world_z: f64) -> RegionQuery {
        self.snapshot().query(world_x, world_z)
    }

    /// Placement and blending parameters the map was generated with.
    pub fn params(&self) -> &RegionParams {
        &self.params
    }

    /// Biome definitions in assignment order.
    pub fn biomes(&self) -> &[BiomeDef] {
        &self.biomes
    }
}

fn sanitize_biomes(biomes: Vec<BiomeDef>) -> Vec<BiomeDef> {
    if biomes.is_empty() {
        warn!("No biome configuration supplied, using the built-in biome set");
        return default_biomes();
    }
    biomes
        .into_iter()
        .map(|mut def| {
            if def.sub_biomes.is_empty() {
                debug!(biome = def.biome_type.name(), "Biome has no sub-biomes, using defaults");
                def.sub_biomes = default_sub_biomes(def.biome_type);
            }
            def
        })
        .collect()
}

fn build_snapshot(seed: u64, params: &RegionParams, biomes: &[BiomeDef]) -> RegionSnapshot {
    let points = place_seed_points(seed, params);
    let regions = assign_biomes(seed, &points, biomes);
    debug!(seed, regions = regions.len(), "Generated region layout");
    RegionSnapshot::new(seed, regions, params.clone())
}
