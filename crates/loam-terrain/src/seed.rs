//! Deterministic seeded generation utilities.
//!
//! Provides per-chunk RNG derivation from a global seed and chunk coordinate,
//! plus deterministic math via `libm` so position hashes are reproducible
//! across platforms.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use loam_coords::ChunkCoord;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Derive a u64 seed for a chunk from a global seed and chunk coordinate.
///
/// Uses SipHash (via std's `DefaultHasher`) to combine the seed with the
/// coordinate into a well-distributed u64.
pub fn derive_chunk_seed(global_seed: u64, coord: ChunkCoord) -> u64 {
    let mut hasher = DefaultHasher::new();
    global_seed.hash(&mut hasher);
    coord.x.hash(&mut hasher);
    coord.y.hash(&mut hasher);
    hasher.finish()
}

/// Derive a deterministic RNG for a specific chunk.
///
/// The returned RNG produces an identical sequence for the same
/// `(global_seed, coord)` pair, regardless of thread or platform.
pub fn chunk_rng(global_seed: u64, coord: ChunkCoord) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(derive_chunk_seed(global_seed, coord))
}

// ---------------------------------------------------------------------------
// Deterministic math (libm)
// ---------------------------------------------------------------------------

/// Deterministic sine using libm (not platform libc).
#[inline]
pub fn det_sin(x: f64) -> f64 {
    libm::sin(x)
}

/// Cheap positional hash in `[-1, 1]`: `fract(sin(x*A + z*B) * C)` remapped.
///
/// Purely a function of position, so colors derived from it need no stored
/// per-vertex random state.
#[inline]
pub fn position_hash(x: f64, z: f64) -> f64 {
    let s = det_sin(x * 12.9898 + z * 78.233) * 43_758.545_3;
    let fract = s - libm::floor(s);
    fract * 2.0 - 1.0
}
