//! Distance-band LOD selection on the chunk grid.

use loam_coords::ChunkCoord;

/// Resolution tier of a chunk mesh, ordered from finest to coarsest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LodLevel {
    /// Full resolution, flat-shaded, collidable, carries trees.
    High,
    Medium,
    Low,
}

impl LodLevel {
    pub const ALL: [LodLevel; 3] = [LodLevel::High, LodLevel::Medium, LodLevel::Low];

    /// Whether chunks at this level get a collider and trees.
    pub fn is_high(self) -> bool {
        self == LodLevel::High
    }
}

impl std::fmt::Display for LodLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LodLevel::High => "high",
            LodLevel::Medium => "medium",
            LodLevel::Low => "low",
        };
        f.write_str(name)
    }
}

/// Chebyshev distance bands between LOD levels.
///
/// `d <= high_distance` is High, `d <= medium_distance` is Medium, anything
/// farther is Low.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodBands {
    high_distance: u32,
    medium_distance: u32,
}

impl LodBands {
    /// # Panics
    ///
    /// Panics if `high_distance > medium_distance`.
    pub fn new(high_distance: u32, medium_distance: u32) -> Self {
        assert!(
            high_distance <= medium_distance,
            "high band must not extend past the medium band"
        );
        Self {
            high_distance,
            medium_distance,
        }
    }

    pub fn high_distance(&self) -> u32 {
        self.high_distance
    }

    pub fn medium_distance(&self) -> u32 {
        self.medium_distance
    }

    /// LOD for a chunk `distance` grid steps from the viewer chunk.
    pub fn select(&self, distance: u32) -> LodLevel {
        if distance <= self.high_distance {
            LodLevel::High
        } else if distance <= self.medium_distance {
            LodLevel::Medium
        } else {
            LodLevel::Low
        }
    }

    /// LOD for `coord` as seen from `viewer_chunk`.
    pub fn select_for(&self, viewer_chunk: ChunkCoord, coord: ChunkCoord) -> LodLevel {
        self.select(viewer_chunk.chebyshev_distance(coord))
    }
}

impl Default for LodBands {
    fn default() -> Self {
        Self::new(1, 3)
    }
}

/// Samples per chunk side for each LOD level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodGridSizes {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl LodGridSizes {
    pub fn grid_size(&self, lod: LodLevel) -> usize {
        match lod {
            LodLevel::High => self.high,
            LodLevel::Medium => self.medium,
            LodLevel::Low => self.low,
        }
    }
}

impl Default for LodGridSizes {
    fn default() -> Self {
        Self {
            high: 121,
            medium: 61,
            low: 31,
        }
    }
}
