//! Vegetation scattering for high-detail chunks.

use glam::{DVec2, DVec3, Vec3};
use loam_coords::ChunkCoord;
use rand::Rng;

use crate::grid::HeightGrid;
use crate::heightfield::HeightFieldGenerator;
use crate::noise_field::NoiseField;
use crate::region::BiomeSource;
use crate::seed::chunk_rng;

const TREE_NOISE_SALT: u64 = 31;
const VERTICAL_JITTER: f32 = 0.1;

/// Tree scattering parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeParams {
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
    /// Frequency of the clustering noise.
    pub noise_scale: f64,
    /// Candidates where the clustering noise is at or below this are rejected.
    pub noise_threshold: f64,
    /// Mean uniform scale.
    pub base_scale: f32,
    /// Relative scale variation (0.2 = +-20%).
    pub scale_variation: f32,
    /// Number of prefab variants to choose from (at least 1).
    pub variant_count: u8,
}

impl Default for TreeParams {
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

/// One placed tree, relative to its chunk's origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreePlacement {
    /// Chunk-local position; `y` is the terrain height at the base.
    pub position: Vec3,
    /// Rotation about +Y in radians, in `[0, TAU)`.
    pub yaw: f32,
    /// Per-axis scale; `x == z`, `y` slightly varied.
    pub scale: Vec3,
    /// Prefab variant index.
    pub variant: u8,
}

/// The tree instances of one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkTrees {
    coord: ChunkCoord,
    origin: DVec2,
    placements: Vec<TreePlacement>,
}

impl ChunkTrees {
    /// An empty set for the chunk at `coord` whose corner is `origin`.
    pub fn empty(coord: ChunkCoord, origin: DVec2) -> Self {
        Self {
            coord,
            origin,
            placements: Vec::new(),
        }
    }

    /// Chunk these trees belong to.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// Placements in scatter order.
    pub fn placements(&self) -> &[TreePlacement] {
        &self.placements
    }

    /// Number of placed trees.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// World position of placement `index`.
    pub fn world_position(&self, index: usize) -> Option<DVec3> {
        self.placements
            .get(index)
            .map(|p| self.to_world(p.position))
    }

    fn to_world(&self, local: Vec3) -> DVec3 {
        DVec3::new(
            self.origin.x + local.x as f64,
            local.y as f64,
            self.origin.y + local.z as f64,
        )
    }

    /// Removes the placement closest to `point`, if one lies within
    /// `max_distance`. Returns its former index and the placement.
    pub fn remove_nearest(&mut self, point: DVec3, max_distance: f64) -> Option<(usize, TreePlacement)> {
        let limit_sq = max_distance * max_distance;
        let (index, _) = self
            .placements
            .iter()
            .enumerate()
            .map(|(i, p)| (i, self.to_world(p.position).distance_squared(point)))
            .filter(|&(_, d)| d <= limit_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;
        Some((index, self.placements.remove(index)))
    }

    /// Removes every placement.
    pub fn clear(&mut self) {
        self.placements.clear();
    }
}

/// Places trees on a chunk's height grid.
#[derive(Clone, Debug)]
pub struct TreeScatterer {
    params: TreeParams,
    noise: NoiseField,
}

impl TreeScatterer {
    pub fn new(params: TreeParams) -> Self {
        Self {
            noise: NoiseField::derived(params.seed, TREE_NOISE_SALT),
            params,
        }
    }

    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Candidate count for a chunk footprint of the given edge length.
    pub fn candidate_count(&self, chunk_world_size: f64) -> usize {
        let wanted = (chunk_world_size * chunk_world_size * self.params.density)
            .ceil()
            .max(0.0);
        (wanted as u64).min(self.params.max_candidates as u64) as usize
    }

    /// Scatters trees over `grid`.
    ///
    /// Heights come from the nearest grid sample rather than the noise
    /// function, so trees sit on the displayed surface. The RNG is derived
    /// from the tree seed and the chunk coordinate, and every candidate
    /// consumes the same number of draws whether or not it is accepted.
    pub fn scatter(
        &self,
        grid: &HeightGrid,
        generator: &HeightFieldGenerator,
        biomes: &BiomeSource,
    ) -> ChunkTrees {
        let p = &self.params;
        let coord = grid.coord();
        let origin = grid.origin();
        let extent = grid.world_size();
        let mut trees = ChunkTrees::empty(coord, origin);
        let cap = p.max_per_chunk as usize;
        if cap == 0 {
            return trees;
        }

        let mut rng = chunk_rng(p.seed, coord);
        let variants = p.variant_count.max(1);

        for _ in 0..self.candidate_count(extent) {
            let local_x = rng.random::<f64>() * extent;
            let local_z = rng.random::<f64>() * extent;
            let roll = rng.random::<f32>();
            let yaw = rng.random_range(0.0..std::f32::consts::TAU);
            let scale_jitter = rng.random::<f32>() * 2.0 - 1.0;
            let vertical_jitter = rng.random::<f32>() * 2.0 - 1.0;
            let variant = rng.random_range(0..variants);

            let world_x = origin.x + local_x;
            let world_z = origin.y + local_z;

            let biome = biomes.sample(world_x, world_z);
            if !biome.trees_allowed() {
                continue;
            }

            let height = grid.sample_nearest(local_x, local_z);
            let normalized = generator.normalize(height as f64) as f32;
            if normalized < p.min_height || normalized > p.max_height {
                continue;
            }

            let cluster = self.noise.sample(world_x * p.noise_scale, world_z * p.noise_scale);
            if cluster <= p.noise_threshold || roll >= biome.attributes.tree_probability {
                continue;
            }

            let s = p.base_scale * (1.0 + scale_jitter * p.scale_variation);
            trees.placements.push(TreePlacement {
                position: Vec3::new(local_x as f32, height, local_z as f32),
                yaw,
                scale: Vec3::new(s, s * (1.0 + vertical_jitter * VERTICAL_JITTER), s),
                variant,
            });
            if trees.placements.len() >= cap {
                break;
            }
        }

        trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::HeightParams;
    use crate::region::{BiomeDef, BiomeType, RegionMap, RegionParams, SubBiome};
    use std::sync::Arc;

    fn lush_biomes() -> BiomeSource {
        let sub = SubBiome {
            name: "Grove".into(),
            weight: 1.0,
            primary_color: Vec3::splat(0.3),
            secondary_color: Vec3::splat(0.4),
            height_multiplier: 1.0,
            tree_probability: 1.0,
            water_allowed: true,
        };
        let map = RegionMap::generate(
            1,
            RegionParams::default(),
            vec![BiomeDef {
                biome_type: BiomeType::Tropical,
                sub_biomes: vec![sub],
            }],
        );
        BiomeSource::Regions(map.snapshot())
    }

    fn flat_generator() -> HeightFieldGenerator {
        HeightFieldGenerator::new(1, HeightParams::default())
    }

    /// A grid whose heights all normalize to the middle of the band.
    fn flat_grid(generator: &HeightFieldGenerator, coord: ChunkCoord) -> HeightGrid {
        let p = generator.params();
        let mid = (p.min_height + (generator.max_height() - p.min_height) * 0.3) as f32;
        HeightGrid::from_heights(coord, 5, 120.0, vec![mid; 25])
    }

    fn permissive() -> TreeParams {
        TreeParams {
            density: 1.0,
            max_candidates: 5000,
            max_per_chunk: 25,
            min_height: 0.0,
            max_height: 1.0,
            noise_threshold: -1.0,
            ..TreeParams::default()
        }
    }

    #[test]
    fn test_cap_is_never_exceeded() {
        let generator = flat_generator();
        let scatterer = TreeScatterer::new(permissive());
        let trees = scatterer.scatter(&flat_grid(&generator, ChunkCoord::new(0, 0)), &generator, &lush_biomes());
        assert_eq!(trees.len(), 25);
    }

    #[test]
    fn test_candidate_count_bounded() {
        let s = TreeScatterer::new(TreeParams {
            density: 0.01,
            max_candidates: 100,
            ..TreeParams::default()
        });
        assert_eq!(s.candidate_count(50.0), 25);
        assert_eq!(s.candidate_count(120.0), 100);
        assert_eq!(s.candidate_count(0.0), 0);
    }

    #[test]
    fn test_deterministic_per_chunk() {
        let generator = flat_generator();
        let biomes = lush_biomes();
        let s = TreeScatterer::new(permissive());
        let coord = ChunkCoord::new(3, -2);
        let a = s.scatter(&flat_grid(&generator, coord), &generator, &biomes);
        let b = s.scatter(&flat_grid(&generator, coord), &generator, &biomes);
        assert_eq!(a, b);
        let other = s.scatter(&flat_grid(&generator, ChunkCoord::new(4, -2)), &generator, &biomes);
        assert_ne!(a.placements(), other.placements());
    }

    #[test]
    fn test_placements_inside_footprint_with_valid_transform() {
        let generator = flat_generator();
        let s = TreeScatterer::new(permissive());
        let grid = flat_grid(&generator, ChunkCoord::new(-1, 2));
        let trees = s.scatter(&grid, &generator, &lush_biomes());
        for t in trees.placements() {
            assert!((0.0..=120.0).contains(&t.position.x));
            assert!((0.0..=120.0).contains(&t.position.z));
            assert_eq!(t.position.y, grid.get(0, 0));
            assert!((0.0..std::f32::consts::TAU).contains(&t.yaw));
            assert!(t.scale.x >= 0.75 && t.scale.x <= 1.25);
            assert!(t.variant < 3);
        }
    }

    #[test]
    fn test_height_band_rejects_everything_outside() {
        let generator = flat_generator();
        let s = TreeScatterer::new(TreeParams {
            min_height: 0.8,
            max_height: 0.9,
            ..permissive()
        });
        let trees = s.scatter(&flat_grid(&generator, ChunkCoord::new(0, 0)), &generator, &lush_biomes());
        assert!(trees.is_empty());
    }

    #[test]
    fn test_treeless_biome_rejects() {
        let generator = flat_generator();
        let sub = SubBiome {
            name: "Salt flat".into(),
            weight: 1.0,
            primary_color: Vec3::ONE,
            secondary_color: Vec3::ONE,
            height_multiplier: 1.0,
            tree_probability: 0.0,
            water_allowed: false,
        };
        let map = RegionMap::generate(
            1,
            RegionParams::default(),
            vec![BiomeDef {
                biome_type: BiomeType::Desert,
                sub_biomes: vec![sub],
            }],
        );
        let biomes = BiomeSource::Regions(map.snapshot());
        let s = TreeScatterer::new(permissive());
        assert!(
            s.scatter(&flat_grid(&generator, ChunkCoord::new(0, 0)), &generator, &biomes)
                .is_empty()
        );
        assert!(!biomes.trees_allowed(0.0, 0.0));
    }

    #[test]
    fn test_remove_nearest() {
        let generator = flat_generator();
        let s = TreeScatterer::new(permissive());
        let mut trees = s.scatter(&flat_grid(&generator, ChunkCoord::new(1, 1)), &generator, &lush_biomes());
        let before = trees.len();
        let target = trees.world_position(3).unwrap();
        let third = trees.placements()[3];

        let (index, removed) = trees.remove_nearest(target + DVec3::new(0.01, 0.0, 0.0), 1.0).unwrap();
        assert_eq!(index, 3);
        assert_eq!(removed, third);
        assert_eq!(trees.len(), before - 1);

        assert!(trees.remove_nearest(DVec3::new(1e6, 0.0, 1e6), 5.0).is_none());
        assert_eq!(trees.len(), before - 1);
    }

    #[test]
    fn test_fallback_biomes_supported() {
        let generator = flat_generator();
        let s = TreeScatterer::new(permissive());
        let biomes = BiomeSource::Fallback(Arc::new(crate::region::FallbackBiomes::new(5)));
        let trees = s.scatter(&flat_grid(&generator, ChunkCoord::new(0, 0)), &generator, &biomes);
        assert!(trees.len() <= 25);
    }
}
