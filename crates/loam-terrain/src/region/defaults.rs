//! Built-in biome set used when no biome configuration is supplied.

use glam::Vec3;

use super::def::{BiomeDef, BiomeType, SubBiome};

fn sub(
    name: &str,
    weight: f32,
    primary: [f32; 3],
    secondary: [f32; 3],
    height_multiplier: f32,
    tree_probability: f32,
    water_allowed: bool,
) -> SubBiome {
    SubBiome {
        name: name.to_string(),
        weight,
        primary_color: Vec3::from_array(primary),
        secondary_color: Vec3::from_array(secondary),
        height_multiplier,
        tree_probability,
        water_allowed,
    }
}

/// Default sub-biomes for one biome type.
pub fn default_sub_biomes(biome_type: BiomeType) -> Vec<SubBiome> {
    match biome_type {
        BiomeType::Temperate => vec![
            sub("Forest", 3.0, [0.18, 0.42, 0.16], [0.36, 0.40, 0.28], 1.0, 0.7, true),
            sub("Meadow", 2.0, [0.38, 0.58, 0.24], [0.48, 0.50, 0.32], 0.8, 0.15, true),
            sub("Lakes", 1.0, [0.26, 0.48, 0.30], [0.40, 0.44, 0.36], 0.6, 0.3, true),
        ],
        BiomeType::Desert => vec![
            sub("Dunes", 3.0, [0.86, 0.74, 0.48], [0.78, 0.60, 0.38], 0.7, 0.0, false),
            sub("Mesa", 1.5, [0.74, 0.46, 0.30], [0.62, 0.36, 0.24], 1.3, 0.02, false),
            sub("Oasis", 0.5, [0.52, 0.62, 0.32], [0.80, 0.70, 0.46], 0.5, 0.35, true),
        ],
        BiomeType::Tundra => vec![
            sub("Permafrost", 2.0, [0.62, 0.66, 0.62], [0.90, 0.92, 0.95], 0.9, 0.04, true),
            sub("Taiga", 1.5, [0.22, 0.34, 0.26], [0.80, 0.84, 0.86], 1.0, 0.45, true),
        ],
        BiomeType::Tropical => vec![
            sub("Jungle", 3.0, [0.10, 0.40, 0.12], [0.22, 0.44, 0.20], 1.1, 0.9, true),
            sub("Savanna", 2.0, [0.62, 0.60, 0.30], [0.54, 0.48, 0.28], 0.7, 0.12, false),
            sub("Wetland", 1.0, [0.24, 0.40, 0.26], [0.30, 0.42, 0.30], 0.5, 0.4, true),
        ],
        BiomeType::Alpine => vec![
            sub("Highlands", 2.0, [0.40, 0.48, 0.30], [0.60, 0.58, 0.56], 1.4, 0.2, true),
            sub("Crags", 1.0, [0.46, 0.44, 0.42], [0.94, 0.94, 0.96], 1.8, 0.02, false),
        ],
    }
}

/// One [`BiomeDef`] per [`BiomeType`] with the default sub-biomes.
pub fn default_biomes() -> Vec<BiomeDef> {
    BiomeType::ALL
        .into_iter()
        .map(|biome_type| BiomeDef {
            biome_type,
            sub_biomes: default_sub_biomes(biome_type),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_covers_every_type() {
        let biomes = default_biomes();
        assert_eq!(biomes.len(), BiomeType::ALL.len());
        for b in &biomes {
            assert!((2..=3).contains(&b.sub_biomes.len()), "{:?}", b.biome_type);
            assert!(b.sub_biomes.iter().all(|s| s.weight > 0.0));
            assert!(
                b.sub_biomes
                    .iter()
                    .all(|s| (0.0..=1.0).contains(&s.tree_probability))
            );
        }
    }
}
