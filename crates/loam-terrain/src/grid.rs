//! Per-chunk height sample grids.

use glam::DVec2;
use loam_coords::ChunkCoord;

use crate::heightfield::HeightFieldGenerator;
use crate::region::BiomeSource;

/// Final terrain height at a world position: the layered noise height
/// scaled by the local biome's height multiplier, floor-clamped again.
///
/// This is the single definition used by chunk grids and by position
/// queries, so both always agree.
pub fn terrain_height(
    generator: &HeightFieldGenerator,
    biomes: &BiomeSource,
    world_x: f64,
    world_z: f64,
) -> f64 {
    let raw = generator.sample_height(world_x, world_z);
    let multiplier = biomes.sample(world_x, world_z).height_multiplier();
    (raw * multiplier).max(generator.params().min_height)
}

/// A `size x size` array of heights covering one chunk footprint.
///
/// Sample `(ix, iz)` of chunk `c` sits at world
/// `((c.x * (size - 1) + ix) * cell, (c.y * (size - 1) + iz) * cell)`.
/// Adjacent chunks at the same resolution therefore evaluate identical
/// world coordinates along their shared edge.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightGrid {
    coord: ChunkCoord,
    size: usize,
    cell_size: f64,
    heights: Vec<f32>,
}

impl HeightGrid {
    /// Samples the terrain for `coord` at `size` samples per side.
    ///
    /// `size` must be at least 2.
    pub fn generate(
        coord: ChunkCoord,
        size: usize,
        chunk_world_size: f64,
        generator: &HeightFieldGenerator,
        biomes: &BiomeSource,
    ) -> Self {
        debug_assert!(size >= 2, "a height grid needs at least one quad");
        let cell_size = chunk_world_size / (size - 1) as f64;
        let mut heights = Vec::with_capacity(size * size);
        for iz in 0..size {
            for ix in 0..size {
                let w = sample_world_position(coord, size, cell_size, ix, iz);
                heights.push(terrain_height(generator, biomes, w.x, w.y) as f32);
            }
        }
        Self {
            coord,
            size,
            cell_size,
            heights,
        }
    }

    /// Builds a grid from precomputed heights (row-major, `z` outer).
    pub fn from_heights(coord: ChunkCoord, size: usize, chunk_world_size: f64, heights: Vec<f32>) -> Self {
        assert_eq!(heights.len(), size * size, "height count must be size * size");
        Self {
            coord,
            size,
            cell_size: chunk_world_size / (size - 1) as f64,
            heights,
        }
    }

    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Samples per side.
    pub fn size(&self) -> usize {
        self.size
    }

    /// World distance between neighbouring samples.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// World edge length of the covered footprint.
    pub fn world_size(&self) -> f64 {
        self.cell_size * (self.size - 1) as f64
    }

    /// Row-major heights.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    #[inline]
    pub fn get(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz * self.size + ix]
    }

    /// World XZ position of sample `(ix, iz)`.
    pub fn world_position(&self, ix: usize, iz: usize) -> DVec2 {
        sample_world_position(self.coord, self.size, self.cell_size, ix, iz)
    }

    /// Position of sample `(ix, iz)` relative to the chunk origin.
    pub fn local_position(&self, ix: usize, iz: usize) -> DVec2 {
        DVec2::new(ix as f64 * self.cell_size, iz as f64 * self.cell_size)
    }

    /// World XZ of the chunk origin (sample `(0, 0)`).
    pub fn origin(&self) -> DVec2 {
        self.world_position(0, 0)
    }

    /// Height of the sample nearest to a chunk-local XZ position.
    /// Positions outside the footprint clamp to the border.
    pub fn sample_nearest(&self, local_x: f64, local_z: f64) -> f32 {
        let last = (self.size - 1) as f64;
        let ix = (local_x / self.cell_size).round().clamp(0.0, last) as usize;
        let iz = (local_z / self.cell_size).round().clamp(0.0, last) as usize;
        self.get(ix, iz)
    }

    /// `(min, max)` over all samples.
    pub fn height_range(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            })
    }
}

#[inline]
fn sample_world_position(coord: ChunkCoord, size: usize, cell: f64, ix: usize, iz: usize) -> DVec2 {
    let span = (size - 1) as i64;
    DVec2::new(
        (coord.x as i64 * span + ix as i64) as f64 * cell,
        (coord.y as i64 * span + iz as i64) as f64 * cell,
    )
}
