//! Seeded 2D gradient noise remapped to the unit interval.

use noise::{NoiseFn, Perlin};

/// Deterministic 2D gradient noise sampler returning values in `[0, 1]`.
///
/// Wraps classic Perlin noise (quintic fade curve). The permutation table is
/// built once from the seed and never mutated, so one field can be shared by
/// any number of worker threads.
#[derive(Clone, Debug)]
pub struct NoiseField {
    perlin: Perlin,
    seed: u32,
}

impl NoiseField {
    /// Creates a field whose permutation table is derived from `seed`.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    /// Creates a field from a 64-bit world seed and a per-layer salt, so
    /// independent layers of one world are decorrelated.
    pub fn derived(world_seed: u64, salt: u64) -> Self {
        let mixed = world_seed
            .wrapping_mul(0x9E37_79B9_7F4A_7C15)
            .wrapping_add(salt.wrapping_mul(0xC2B2_AE3D_27D4_EB4F));
        Self::new((mixed ^ (mixed >> 32)) as u32)
    }

    /// The seed the permutation table was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Samples the field at `(x, y)`. Always in `[0, 1]`.
    #[inline]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let raw = self.perlin.get([x, y]);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}
