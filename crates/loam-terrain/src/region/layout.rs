//! Region seed-point placement and biome assignment.

use glam::DVec2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::def::{BiomeDef, Region};
use super::snapshot::RegionParams;

const LAYOUT_SALT: u64 = 0x5EED_F4E6_10A5;

/// Places `params.region_count` seed points (at least one) by rejection
/// sampling with a minimum pairwise distance.
///
/// Each point gets `max_placement_attempts` tries. When every try lands too
/// close to an existing seed, the candidate farthest from its nearest seed
/// is kept so the count is always honoured.
pub fn place_seed_points(seed: u64, params: &RegionParams) -> Vec<DVec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ LAYOUT_SALT);
    let count = params.region_count.max(1);
    let extent = params.world_extent.max(0.0);
    let attempts = params.max_placement_attempts.max(1);
    let min_dist_sq = params.min_seed_distance * params.min_seed_distance;

    let mut points: Vec<DVec2> = Vec::with_capacity(count);
    for _ in 0..count {
        let mut best = DVec2::ZERO;
        let mut best_dist_sq = -1.0;

        for _ in 0..attempts {
            let candidate = DVec2::new(
                (rng.random::<f64>() * 2.0 - 1.0) * extent,
                (rng.random::<f64>() * 2.0 - 1.0) * extent,
            );
            let nearest_sq = points
                .iter()
                .map(|p| p.distance_squared(candidate))
                .fold(f64::INFINITY, f64::min);

            if nearest_sq > best_dist_sq {
                best = candidate;
                best_dist_sq = nearest_sq;
            }
            if nearest_sq >= min_dist_sq {
                break;
            }
        }

        points.push(best);
    }
    points
}

/// Builds regions from seed points, assigning biomes round-robin over
/// `biomes` for the first `biomes.len()` regions and at random afterwards.
///
/// `biomes` must be non-empty and every entry must have sub-biomes.
pub fn assign_biomes(seed: u64, points: &[DVec2], biomes: &[BiomeDef]) -> Vec<Region> {
    debug_assert!(!biomes.is_empty());
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ LAYOUT_SALT.rotate_left(17));

    points
        .iter()
        .enumerate()
        .map(|(i, &seed_point)| {
            let def = if i < biomes.len() {
                &biomes[i]
            } else {
                &biomes[rng.random_range(0..biomes.len())]
            };
            Region {
                id: i as u32,
                seed_point,
                biome_type: def.biome_type,
                sub_biomes: def.sub_biomes.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::defaults::default_biomes;

    fn params() -> RegionParams {
        RegionParams {
            region_count: 16,
            world_extent: 4000.0,
            min_seed_distance: 600.0,
            max_placement_attempts: 50,
            ..RegionParams::default()
        }
    }

    #[test]
    fn test_placement_is_deterministic() {
        assert_eq!(place_seed_points(9, &params()), place_seed_points(9, &params()));
        assert_ne!(place_seed_points(9, &params()), place_seed_points(10, &params()));
    }

    #[test]
    fn test_points_respect_extent_and_spacing() {
        let p = params();
        let points = place_seed_points(42, &p);
        assert_eq!(points.len(), 16);
        for (i, a) in points.iter().enumerate() {
            assert!(a.x.abs() <= p.world_extent && a.y.abs() <= p.world_extent);
            for b in &points[i + 1..] {
                assert!(
                    a.distance(*b) >= p.min_seed_distance,
                    "seeds {a} and {b} too close"
                );
            }
        }
    }

    #[test]
    fn test_crowded_layout_still_places_every_seed() {
        let p = RegionParams {
            region_count: 40,
            world_extent: 100.0,
            min_seed_distance: 500.0,
            max_placement_attempts: 4,
            ..RegionParams::default()
        };
        let points = place_seed_points(1, &p);
        assert_eq!(points.len(), 40);
    }

    #[test]
    fn test_zero_count_places_one_seed() {
        let p = RegionParams {
            region_count: 0,
            ..params()
        };
        assert_eq!(place_seed_points(3, &p).len(), 1);
    }

    #[test]
    fn test_round_robin_then_random() {
        let biomes = default_biomes();
        let points = place_seed_points(42, &params());
        let regions = assign_biomes(42, &points, &biomes);
        assert_eq!(regions.len(), points.len());
        for (i, b) in biomes.iter().enumerate() {
            assert_eq!(regions[i].biome_type, b.biome_type);
            assert_eq!(regions[i].id, i as u32);
        }
        assert!(regions.iter().all(|r| !r.sub_biomes.is_empty()));
    }
}
