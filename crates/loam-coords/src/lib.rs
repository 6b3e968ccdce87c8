//! Chunk grid coordinates and conversions between world space and the chunk grid.
//!
//! The terrain is a heightfield over the world XZ plane, partitioned into square
//! chunks of a fixed world size. A [`ChunkCoord`] names one tile of that grid;
//! its `y` component indexes the world Z axis.

use glam::{DVec2, DVec3};

/// Integer position of a chunk on the uniform terrain grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkCoord {
    /// Grid column (world X axis).
    pub x: i32,
    /// Grid row (world Z axis).
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the chunk containing the given world position.
    ///
    /// Uses floor division so negative coordinates map to negative chunks
    /// (world X = -0.5 lies in chunk -1, not chunk 0).
    pub fn from_world(position: DVec3, chunk_world_size: f64) -> Self {
        Self::from_world_xz(position.x, position.z, chunk_world_size)
    }

    /// Returns the chunk containing the world XZ point.
    pub fn from_world_xz(world_x: f64, world_z: f64, chunk_world_size: f64) -> Self {
        debug_assert!(chunk_world_size > 0.0, "chunk size must be positive");
        Self {
            x: (world_x / chunk_world_size).floor() as i32,
            y: (world_z / chunk_world_size).floor() as i32,
        }
    }

    /// World XZ position of the chunk's minimum corner.
    pub fn origin(self, chunk_world_size: f64) -> DVec2 {
        DVec2::new(
            self.x as f64 * chunk_world_size,
            self.y as f64 * chunk_world_size,
        )
    }

    /// World XZ position of the chunk's center.
    pub fn center(self, chunk_world_size: f64) -> DVec2 {
        self.origin(chunk_world_size) + DVec2::splat(chunk_world_size * 0.5)
    }

    /// Returns the coordinate offset by `(dx, dy)` grid steps.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev (chessboard) distance in grid steps.
    ///
    /// This is the metric used for render distance and LOD bands: a chunk
    /// diagonal to the viewer chunk is at distance 1.
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        dx.max(dy) as u32
    }

    /// Squared Euclidean distance in grid steps, used to order work nearest-first.
    pub fn distance_sq(self, other: Self) -> u64 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        dx * dx + dy * dy
    }

    /// Returns `true` if the world XZ point lies inside this chunk's footprint.
    pub fn contains_xz(self, world_x: f64, world_z: f64, chunk_world_size: f64) -> bool {
        Self::from_world_xz(world_x, world_z, chunk_world_size) == self
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Iterates every coordinate within Chebyshev distance `radius` of `center`,
/// row by row. Yields `(2 * radius + 1)^2` coordinates.
pub fn chunks_within(center: ChunkCoord, radius: u32) -> impl Iterator<Item = ChunkCoord> {
    let r = radius as i32;
    (-r..=r).flat_map(move |dy| (-r..=r).map(move |dx| center.offset(dx, dy)))
}
