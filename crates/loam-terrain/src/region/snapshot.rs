//! Immutable region data shared with background workers.

use glam::DVec2;

use super::def::{Region, SubBiome};
use crate::heightfield::smoothstep;
use crate::noise_field::NoiseField;

const BOUNDARY_X_SALT: u64 = 11;
const BOUNDARY_Z_SALT: u64 = 12;
const SUB_BIOME_SALT: u64 = 13;
/// Gradient noise clusters around 0.5; stretch it so low-weight
/// sub-biomes at the end of the list still get selected.
const SUB_BIOME_CONTRAST: f64 = 1.8;

/// Layout and blending parameters of a region map.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionParams {
    /// Number of regions to generate (at least one is always produced).
    pub region_count: usize,
    /// Seed points are placed in `[-world_extent, world_extent]` on both axes.
    pub world_extent: f64,
    /// Minimum spacing between seed points.
    pub min_seed_distance: f64,
    /// Rejection-sampling tries per seed point.
    pub max_placement_attempts: u32,
    /// Width of the blend band on each side of a boundary.
    pub blend_distance: f64,
    /// Frequency of the boundary distortion noise.
    pub boundary_noise_scale: f64,
    /// Maximum displacement of a query point, in world units.
    pub boundary_noise_strength: f64,
    /// Frequency of the sub-biome selection noise.
    pub sub_biome_noise_scale: f64,
}

impl Default for RegionParams {
    fn default() -> Self {
        Self {
            region_count: 24,
            world_extent: 6000.0,
            min_seed_distance: 900.0,
            max_placement_attempts: 30,
            blend_distance: 120.0,
            boundary_noise_scale: 0.004,
            boundary_noise_strength: 150.0,
            sub_biome_noise_scale: 0.003,
        }
    }
}

/// Result of a region lookup at one world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionQuery {
    /// Index of the nearest region.
    pub primary: usize,
    /// Index of the second-nearest region (equal to `primary` with one region).
    pub secondary: usize,
    /// `1.0` on the boundary, falling to `0.0` at `blend_distance` from it.
    pub blend_factor: f64,
    /// Selected sub-biome inside the primary region.
    pub primary_sub_biome: usize,
    /// Selected sub-biome inside the secondary region.
    pub secondary_sub_biome: usize,
    /// `(d2 - d1) / 2`, the distance to the (distorted) boundary.
    pub distance_to_edge: f64,
}

/// Sub-biome attributes blended between the two nearest regions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlendedAttributes {
    pub primary_color: glam::Vec3,
    pub secondary_color: glam::Vec3,
    pub height_multiplier: f32,
    pub tree_probability: f32,
    pub water_allowed: bool,
}

impl BlendedAttributes {
    pub(crate) fn from_sub_biome(sub: &SubBiome) -> Self {
        Self {
            primary_color: sub.primary_color,
            secondary_color: sub.secondary_color,
            height_multiplier: sub.height_multiplier,
            tree_probability: sub.tree_probability,
            water_allowed: sub.water_allowed,
        }
    }

    pub(crate) fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            primary_color: self.primary_color.lerp(other.primary_color, t),
            secondary_color: self.secondary_color.lerp(other.secondary_color, t),
            height_multiplier: self.height_multiplier
                + (other.height_multiplier - self.height_multiplier) * t,
            tree_probability: self.tree_probability
                + (other.tree_probability - self.tree_probability) * t,
            water_allowed: if t < 0.5 {
                self.water_allowed
            } else {
                other.water_allowed
            },
        }
    }
}

/// All regions of one world seed plus the noise channels used to query them.
///
/// Never mutated after construction; replaced wholesale on rebuild. Workers
/// hold it through an `Arc`, so an old snapshot stays valid for as long as
/// any in-flight task uses it.
#[derive(Debug)]
pub struct RegionSnapshot {
    seed: u64,
    regions: Vec<Region>,
    params: RegionParams,
    boundary_x: NoiseField,
    boundary_z: NoiseField,
    sub_biome_noise: NoiseField,
}

impl RegionSnapshot {
    /// `regions` must be non-empty and each region must own sub-biomes.
    pub(crate) fn new(seed: u64, regions: Vec<Region>, params: RegionParams) -> Self {
        debug_assert!(!regions.is_empty());
        debug_assert!(regions.iter().all(|r| !r.sub_biomes.is_empty()));
        Self {
            seed,
            regions,
            params,
            boundary_x: NoiseField::derived(seed, BOUNDARY_X_SALT),
            boundary_z: NoiseField::derived(seed, BOUNDARY_Z_SALT),
            sub_biome_noise: NoiseField::derived(seed, SUB_BIOME_SALT),
        }
    }

    /// World seed the regions were generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn params(&self) -> &RegionParams {
        &self.params
    }

    /// Query point after organic boundary distortion.
    pub fn distort(&self, world_x: f64, world_z: f64) -> DVec2 {
        let s = self.params.boundary_noise_scale;
        let strength = self.params.boundary_noise_strength;
        if strength == 0.0 {
            return DVec2::new(world_x, world_z);
        }
        let dx = (self.boundary_x.sample(world_x * s, world_z * s) * 2.0 - 1.0) * strength;
        let dz = (self.boundary_z.sample(world_x * s, world_z * s) * 2.0 - 1.0) * strength;
        DVec2::new(world_x + dx, world_z + dz)
    }

    /// Which regions apply at a world position, and how strongly they blend.
    pub fn query(&self, world_x: f64, world_z: f64) -> RegionQuery {
        let p = self.distort(world_x, world_z);

        let mut first = (0usize, f64::INFINITY);
        let mut second = (0usize, f64::INFINITY);
        for (i, region) in self.regions.iter().enumerate() {
            let d = region.seed_point.distance(p);
            if d < first.1 {
                second = first;
                first = (i, d);
            } else if d < second.1 {
                second = (i, d);
            }
        }

        let (secondary, distance_to_edge) = if second.1.is_finite() {
            (second.0, (second.1 - first.1) * 0.5)
        } else {
            (first.0, f64::INFINITY)
        };
        let blend_factor = blend_factor(distance_to_edge, self.params.blend_distance);

        RegionQuery {
            primary: first.0,
            secondary,
            blend_factor,
            primary_sub_biome: self.select_sub_biome(first.0, world_x, world_z),
            secondary_sub_biome: self.select_sub_biome(secondary, world_x, world_z),
            distance_to_edge,
        }
    }

    /// Weighted cumulative-sum pick keyed by the sub-biome noise channel.
    fn select_sub_biome(&self, region: usize, world_x: f64, world_z: f64) -> usize {
        let subs = &self.regions[region].sub_biomes;
        if subs.len() == 1 {
            return 0;
        }
        let total: f32 = subs.iter().map(|s| s.weight.max(0.0)).sum();
        if total <= 0.0 {
            return 0;
        }

        // Offset per region so neighbouring regions do not share a pattern.
        let s = self.params.sub_biome_noise_scale;
        let shift = region as f64 * 173.31;
        let n = self
            .sub_biome_noise
            .sample(world_x * s + shift, world_z * s - shift);
        let key = ((n - 0.5) * SUB_BIOME_CONTRAST + 0.5).clamp(0.0, 1.0) as f32 * total;

        let mut acc = 0.0;
        let mut last_positive = 0;
        for (i, sub) in subs.iter().enumerate() {
            if sub.weight <= 0.0 {
                continue;
            }
            acc += sub.weight;
            last_positive = i;
            if key <= acc {
                return i;
            }
        }
        last_positive
    }

    /// Blended sub-biome attributes for a query result.
    ///
    /// Both sides of a boundary interpolate toward the shared midpoint, with
    /// weight `blend_factor / 2` on the other region, so attributes are
    /// continuous across the boundary.
    pub fn attributes(&self, q: &RegionQuery) -> BlendedAttributes {
        let primary = BlendedAttributes::from_sub_biome(
            &self.regions[q.primary].sub_biomes[q.primary_sub_biome],
        );
        if q.secondary == q.primary || q.blend_factor <= 0.0 {
            return primary;
        }
        let secondary = BlendedAttributes::from_sub_biome(
            &self.regions[q.secondary].sub_biomes[q.secondary_sub_biome],
        );
        primary.lerp(&secondary, (q.blend_factor * 0.5) as f32)
    }
}

/// `smoothstep(0, 1, 1 - edge / width)` inside the band, `0` outside.
pub fn blend_factor(distance_to_edge: f64, blend_distance: f64) -> f64 {
    if blend_distance <= 0.0 || distance_to_edge >= blend_distance {
        return 0.0;
    }
    smoothstep(0.0, 1.0, 1.0 - distance_to_edge / blend_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::defaults::default_sub_biomes;
    use crate::region::def::BiomeType;
    use glam::Vec3;

    fn region(id: u32, x: f64, z: f64, biome_type: BiomeType) -> Region {
        Region {
            id,
            seed_point: DVec2::new(x, z),
            biome_type,
            sub_biomes: default_sub_biomes(biome_type),
        }
    }

    fn single_sub(name: &str, color: f32, trees: f32) -> Vec<SubBiome> {
        vec![SubBiome {
            name: name.into(),
            weight: 1.0,
            primary_color: Vec3::splat(color),
            secondary_color: Vec3::splat(color),
            height_multiplier: 1.0,
            tree_probability: trees,
            water_allowed: true,
        }]
    }

    fn undistorted(blend: f64) -> RegionParams {
        RegionParams {
            blend_distance: blend,
            boundary_noise_strength: 0.0,
            ..RegionParams::default()
        }
    }

    fn two_regions() -> RegionSnapshot {
        let mut a = region(0, -500.0, 0.0, BiomeType::Temperate);
        let mut b = region(1, 500.0, 0.0, BiomeType::Desert);
        a.sub_biomes = single_sub("A", 0.0, 0.0);
        b.sub_biomes = single_sub("B", 1.0, 1.0);
        RegionSnapshot::new(1, vec![a, b], undistorted(100.0))
    }

    #[test]
    fn test_midpoint_blend_is_one() {
        let snap = two_regions();
        let q = snap.query(0.0, 37.0);
        assert_eq!(q.distance_to_edge, 0.0);
        assert_eq!(q.blend_factor, 1.0);
    }

    #[test]
    fn test_blend_zero_beyond_width() {
        let snap = two_regions();
        // edge distance = x for a point at (x, 0) between seeds at +-500.
        let q = snap.query(-150.0, 0.0);
        assert_eq!(q.primary, 0);
        assert_eq!(q.secondary, 1);
        assert!((q.distance_to_edge - 150.0).abs() < 1e-9);
        assert_eq!(q.blend_factor, 0.0);
        assert_eq!(snap.query(-100.0, 0.0).blend_factor, 0.0);
        let inside = snap.query(-50.0, 0.0).blend_factor;
        assert!(inside > 0.0 && inside < 1.0, "{inside}");
    }

    #[test]
    fn test_attributes_continuous_across_boundary() {
        let snap = two_regions();
        let left = snap.attributes(&snap.query(-1e-6, 0.0));
        let right = snap.attributes(&snap.query(1e-6, 0.0));
        assert!((left.tree_probability - 0.5).abs() < 1e-4);
        assert!((left.tree_probability - right.tree_probability).abs() < 1e-4);
        assert!(left.primary_color.abs_diff_eq(right.primary_color, 1e-4));
        // Far inside a region the pure sub-biome applies.
        let far = snap.attributes(&snap.query(-400.0, 0.0));
        assert_eq!(far.tree_probability, 0.0);
    }

    #[test]
    fn test_single_region() {
        let snap = RegionSnapshot::new(
            4,
            vec![region(0, 0.0, 0.0, BiomeType::Tundra)],
            RegionParams::default(),
        );
        let q = snap.query(12_345.0, -999.0);
        assert_eq!(q.primary, 0);
        assert_eq!(q.secondary, 0);
        assert_eq!(q.blend_factor, 0.0);
        assert!(q.distance_to_edge.is_infinite());
    }

    #[test]
    fn test_query_is_pure() {
        let snap = RegionSnapshot::new(
            42,
            vec![
                region(0, 0.0, 0.0, BiomeType::Temperate),
                region(1, 900.0, 300.0, BiomeType::Alpine),
                region(2, -600.0, 800.0, BiomeType::Tropical),
            ],
            RegionParams::default(),
        );
        for i in 0..300 {
            let (x, z) = (i as f64 * 13.7 - 1500.0, i as f64 * 7.1 - 400.0);
            assert_eq!(snap.query(x, z), snap.query(x, z));
        }
    }

    #[test]
    fn test_sub_biome_selection_respects_weights() {
        let mut r = region(0, 0.0, 0.0, BiomeType::Temperate);
        r.sub_biomes[0].weight = 0.0;
        r.sub_biomes[2].weight = 0.0;
        let snap = RegionSnapshot::new(5, vec![r], RegionParams::default());
        for i in 0..200 {
            let q = snap.query(i as f64 * 41.0, i as f64 * -17.0);
            assert_eq!(q.primary_sub_biome, 1);
        }
    }

    #[test]
    fn test_sub_biome_selection_uses_every_variant() {
        let snap = RegionSnapshot::new(
            7,
            vec![region(0, 0.0, 0.0, BiomeType::Temperate)],
            RegionParams {
                sub_biome_noise_scale: 0.01,
                ..RegionParams::default()
            },
        );
        let mut seen = [false; 3];
        for i in 0..100 {
            for j in 0..100 {
                let q = snap.query(i as f64 * 37.0, j as f64 * 37.0);
                seen[q.primary_sub_biome] = true;
            }
        }
        assert!(seen.iter().all(|s| *s), "{seen:?}");
    }

    #[test]
    fn test_distortion_bounded() {
        let snap = RegionSnapshot::new(
            3,
            vec![region(0, 0.0, 0.0, BiomeType::Desert)],
            RegionParams {
                boundary_noise_strength: 50.0,
                ..RegionParams::default()
            },
        );
        for i in 0..200 {
            let (x, z) = (i as f64 * 31.0, i as f64 * 11.0);
            let d = snap.distort(x, z);
            assert!((d.x - x).abs() <= 50.0 && (d.y - z).abs() <= 50.0);
        }
    }

    #[test]
    fn test_blend_factor_function() {
        assert_eq!(blend_factor(0.0, 10.0), 1.0);
        assert_eq!(blend_factor(10.0, 10.0), 0.0);
        assert_eq!(blend_factor(5.0, 10.0), 0.5);
        assert_eq!(blend_factor(0.0, 0.0), 0.0);
    }
}
