//! Region and biome definitions.

use glam::{DVec2, Vec3};

/// Broad climate class of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeType {
    Temperate,
    Desert,
    Tundra,
    Tropical,
    Alpine,
}

impl BiomeType {
    /// All biome types in their canonical order.
    pub const ALL: [BiomeType; 5] = [
        BiomeType::Temperate,
        BiomeType::Desert,
        BiomeType::Tundra,
        BiomeType::Tropical,
        BiomeType::Alpine,
    ];

    /// Parses a configuration name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "temperate" => Some(Self::Temperate),
            "desert" => Some(Self::Desert),
            "tundra" => Some(Self::Tundra),
            "tropical" => Some(Self::Tropical),
            "alpine" => Some(Self::Alpine),
            _ => None,
        }
    }

    /// Lowercase configuration name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Temperate => "temperate",
            Self::Desert => "desert",
            Self::Tundra => "tundra",
            Self::Tropical => "tropical",
            Self::Alpine => "alpine",
        }
    }
}

/// A weighted variant inside a region (e.g. "Forest" vs "Lakes").
#[derive(Clone, Debug, PartialEq)]
pub struct SubBiome {
    /// Human-readable name.
    pub name: String,
    /// Relative selection weight. Non-positive weights are never selected.
    pub weight: f32,
    /// Color at low altitude (linear RGB).
    pub primary_color: Vec3,
    /// Color at high altitude (linear RGB).
    pub secondary_color: Vec3,
    /// Multiplier applied to the synthesized height.
    pub height_multiplier: f32,
    /// Probability in `[0, 1]` that an eligible tree candidate is accepted.
    pub tree_probability: f32,
    /// Whether standing water may appear.
    pub water_allowed: bool,
}

/// A configured biome: a climate class plus its ordered sub-biomes.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDef {
    /// Climate class.
    pub biome_type: BiomeType,
    /// Variants chosen by weighted noise inside each region.
    pub sub_biomes: Vec<SubBiome>,
}

/// One Voronoi-like zone of the world. Immutable once generated.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    /// Index of this region in its snapshot.
    pub id: u32,
    /// Seed point on the world XZ plane.
    pub seed_point: DVec2,
    pub biome_type: BiomeType,
    /// Never empty.
    pub sub_biomes: Vec<SubBiome>,
}
