//! Layered-noise height synthesis.
//!
//! A height is the composition of four noise layers sampled at
//! `(world + offset) / scale`:
//!
//! 1. a very-low-frequency continent mask,
//! 2. two octaves of rolling hills,
//! 3. a masked fractal Brownian motion (fBm) mountain layer,
//! 4. sparse ridged mega peaks.
//!
//! The result is floor-clamped at [`HeightParams::min_height`].

use crate::noise_field::NoiseField;

const CONTINENT_SALT: u64 = 1;
const HILLS_SALT: u64 = 2;
const MOUNTAIN_MASK_SALT: u64 = 3;
const MOUNTAIN_SALT: u64 = 4;
const PEAK_MASK_SALT: u64 = 5;
const RIDGE_SALT: u64 = 6;

/// Parameters of the layered height function.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightParams {
    /// World units per noise unit. World coordinates are divided by this.
    pub scale: f64,
    /// World-space offset added to X before scaling.
    pub offset_x: f64,
    /// World-space offset added to Z before scaling.
    pub offset_z: f64,
    /// Octaves of the mountain fBm.
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves. Default: 0.5.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves. Default: 2.0.
    pub lacunarity: f64,
    /// Frequency of the continent mask noise.
    pub continent_frequency: f64,
    /// Continent noise value where land starts rising.
    pub continent_low: f64,
    /// Continent noise value of full continent influence.
    pub continent_high: f64,
    /// Height contributed at full continent influence.
    pub continent_height: f64,
    /// Base frequency of the rolling hills.
    pub hills_frequency: f64,
    /// Amplitude of the first hills octave.
    pub hills_amplitude: f64,
    /// Frequency of the noise that decides where mountains grow.
    pub mountain_mask_frequency: f64,
    /// Mountain mask value below which no mountains appear.
    pub mountain_mask_low: f64,
    /// Mountain mask value of full mountain influence.
    pub mountain_mask_high: f64,
    /// Base frequency of the mountain fBm.
    pub mountain_frequency: f64,
    /// Amplitude of the first mountain octave.
    pub mountain_amplitude: f64,
    /// Frequency of the sparse peak mask.
    pub peak_mask_frequency: f64,
    /// The peak mask is zero below this value of its noise channel.
    pub peak_mask_threshold: f64,
    /// Exponent sharpening the peak mask falloff.
    pub peak_mask_power: f64,
    /// Frequency of the ridged peak noise.
    pub ridge_frequency: f64,
    /// `0.0` uses the smoothed ridge profile, `1.0` the raw folded noise.
    pub ridge_sharpness: f64,
    /// Exponent applied to the ridge profile.
    pub ridge_power: f64,
    /// Height of a peak at full mask.
    pub peak_amplitude: f64,
    /// Constant added to every height.
    pub sea_level_offset: f64,
    /// Floor clamp for the final height.
    pub min_height: f64,
}

impl Default for HeightParams {
    fn default() -> Self {
        Self {
            scale: 10.0,
            offset_x: 0.0,
            offset_z: 0.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            continent_frequency: 0.002,
            continent_low: 0.35,
            continent_high: 0.6,
            continent_height: 12.0,
            hills_frequency: 0.08,
            hills_amplitude: 6.0,
            mountain_mask_frequency: 0.006,
            mountain_mask_low: 0.45,
            mountain_mask_high: 0.7,
            mountain_frequency: 0.03,
            mountain_amplitude: 28.0,
            peak_mask_frequency: 0.004,
            peak_mask_threshold: 0.68,
            peak_mask_power: 1.5,
            ridge_frequency: 0.025,
            ridge_sharpness: 0.6,
            ridge_power: 2.0,
            peak_amplitude: 80.0,
            sea_level_offset: -8.0,
            min_height: -12.0,
        }
    }
}

/// Hermite smoothstep between `edge0` and `edge1`, clamped to `[0, 1]`.
///
/// Reversed edges (`edge0 > edge1`) produce a falling curve.
#[inline]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Per-layer contributions of one height sample, before composition.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeightLayers {
    pub continent: f64,
    pub hills: f64,
    pub mountain_mask: f64,
    pub mountains: f64,
    pub peak_mask: f64,
    pub peaks: f64,
}

/// Composes the noise layers into a scalar height per world position.
///
/// Every layer owns a [`NoiseField`] derived from the world seed, so the
/// generator is immutable after construction and can be shared across
/// worker threads behind an `Arc`.
#[derive(Clone, Debug)]
pub struct HeightFieldGenerator {
    params: HeightParams,
    continent: NoiseField,
    hills: NoiseField,
    mountain_mask: NoiseField,
    mountains: NoiseField,
    peak_mask: NoiseField,
    ridge: NoiseField,
}

impl HeightFieldGenerator {
    /// Create a generator for the given world seed.
    pub fn new(seed: u64, params: HeightParams) -> Self {
        Self {
            continent: NoiseField::derived(seed, CONTINENT_SALT),
            hills: NoiseField::derived(seed, HILLS_SALT),
            mountain_mask: NoiseField::derived(seed, MOUNTAIN_MASK_SALT),
            mountains: NoiseField::derived(seed, MOUNTAIN_SALT),
            peak_mask: NoiseField::derived(seed, PEAK_MASK_SALT),
            ridge: NoiseField::derived(seed, RIDGE_SALT),
            params,
        }
    }

    /// Return a reference to the current parameters.
    pub fn params(&self) -> &HeightParams {
        &self.params
    }

    /// Sample the height at a world XZ position.
    pub fn sample_height(&self, world_x: f64, world_z: f64) -> f64 {
        let l = self.sample_layers(world_x, world_z);
        let p = &self.params;
        let height = (l.hills + l.mountains * l.mountain_mask)
            + l.peaks * l.peak_mask
            + l.continent * p.continent_height
            + p.sea_level_offset;
        height.max(p.min_height)
    }

    /// Evaluate each layer separately. `mountains` and `peaks` are unmasked.
    pub fn sample_layers(&self, world_x: f64, world_z: f64) -> HeightLayers {
        let p = &self.params;
        let nx = (world_x + p.offset_x) / p.scale;
        let nz = (world_z + p.offset_z) / p.scale;

        let continent = smoothstep(
            p.continent_low,
            p.continent_high,
            self.continent
                .sample(nx * p.continent_frequency, nz * p.continent_frequency),
        );

        let hf = p.hills_frequency;
        let hills = self.hills.sample(nx * hf, nz * hf) * p.hills_amplitude
            + self.hills.sample(nx * hf * 2.0, nz * hf * 2.0) * p.hills_amplitude * 0.5;

        let mountain_mask = smoothstep(
            p.mountain_mask_low,
            p.mountain_mask_high,
            self.mountain_mask.sample(
                nx * p.mountain_mask_frequency,
                nz * p.mountain_mask_frequency,
            ),
        );
        let mountains = if mountain_mask > 0.0 {
            self.fbm(nx, nz)
        } else {
            0.0
        };

        let peak_mask = self.peak_mask_at(nx, nz);
        let peaks = if peak_mask > 0.0 {
            self.ridge_at(nx, nz)
        } else {
            0.0
        };

        HeightLayers {
            continent,
            hills,
            mountain_mask,
            mountains,
            peak_mask,
            peaks,
        }
    }

    fn fbm(&self, nx: f64, nz: f64) -> f64 {
        let p = &self.params;
        let mut total = 0.0;
        let mut frequency = p.mountain_frequency;
        let mut amplitude = p.mountain_amplitude;

        for _ in 0..p.octaves {
            total += self.mountains.sample(nx * frequency, nz * frequency) * amplitude;
            frequency *= p.lacunarity;
            amplitude *= p.persistence;
        }

        total
    }

    fn peak_mask_at(&self, nx: f64, nz: f64) -> f64 {
        let p = &self.params;
        let m = self
            .peak_mask
            .sample(nx * p.peak_mask_frequency, nz * p.peak_mask_frequency);
        if m <= p.peak_mask_threshold || p.peak_mask_threshold >= 1.0 {
            return 0.0;
        }
        ((m - p.peak_mask_threshold) / (1.0 - p.peak_mask_threshold)).powf(p.peak_mask_power)
    }

    fn ridge_at(&self, nx: f64, nz: f64) -> f64 {
        let p = &self.params;
        let n = self
            .ridge
            .sample(nx * p.ridge_frequency, nz * p.ridge_frequency);
        let ridge = 1.0 - (2.0 * n - 1.0).abs();
        let sharp = lerp(smoothstep(0.0, 1.0, ridge), ridge, p.ridge_sharpness);
        sharp.powf(p.ridge_power) * p.peak_amplitude
    }

    /// Theoretical upper bound of [`sample_height`](Self::sample_height).
    pub fn max_height(&self) -> f64 {
        let p = &self.params;
        let mut fbm_max = 0.0;
        let mut amp = p.mountain_amplitude;
        for _ in 0..p.octaves {
            fbm_max += amp;
            amp *= p.persistence;
        }
        let hills_max = p.hills_amplitude * 1.5;
        (hills_max + fbm_max + p.peak_amplitude + p.continent_height + p.sea_level_offset)
            .max(p.min_height)
    }

    /// Map a height into `[0, 1]` over `[min_height, max_height]`.
    pub fn normalize(&self, height: f64) -> f64 {
        let min = self.params.min_height;
        let range = self.max_height() - min;
        if range <= f64::EPSILON {
            return 0.0;
        }
        ((height - min) / range).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(seed: u64) -> HeightFieldGenerator {
        HeightFieldGenerator::new(seed, HeightParams::default())
    }

    #[test]
    fn test_determinism_same_seed_same_coord() {
        let a = generator(42);
        let b = generator(42);
        for i in 0..200 {
            let x = i as f64 * 37.3 - 2000.0;
            let z = i as f64 * -11.7 + 500.0;
            assert_eq!(
                a.sample_height(x, z).to_bits(),
                b.sample_height(x, z).to_bits(),
                "height must be bit-identical at ({x}, {z})"
            );
        }
    }

    #[test]
    fn test_different_seeds_produce_different_heights() {
        let a = generator(1);
        let b = generator(999);
        let differs = (0..50).any(|i| {
            let x = i as f64 * 53.0;
            (a.sample_height(x, x * 0.5) - b.sample_height(x, x * 0.5)).abs() > 1e-9
        });
        assert!(differs);
    }

    #[test]
    fn test_height_within_bounds() {
        let g = generator(42);
        let max = g.max_height();
        let min = g.params().min_height;
        for i in 0..100 {
            for j in 0..100 {
                let h = g.sample_height(i as f64 * 61.0 - 3000.0, j as f64 * 47.0 - 2000.0);
                assert!(h >= min, "height {h} below floor {min}");
                assert!(h <= max + 1e-9, "height {h} above bound {max}");
            }
        }
    }

    #[test]
    fn test_floor_clamp() {
        let params = HeightParams {
            sea_level_offset: -10_000.0,
            min_height: -5.0,
            ..HeightParams::default()
        };
        let g = HeightFieldGenerator::new(3, params);
        for i in 0..50 {
            assert_eq!(g.sample_height(i as f64 * 10.0, 0.0), -5.0);
        }
    }

    #[test]
    fn test_offset_shifts_sampling() {
        let shifted = HeightFieldGenerator::new(
            42,
            HeightParams {
                offset_x: 250.0,
                offset_z: -40.0,
                ..HeightParams::default()
            },
        );
        let plain = generator(42);
        assert_eq!(
            shifted.sample_height(0.0, 0.0),
            plain.sample_height(250.0, -40.0)
        );
    }

    #[test]
    fn test_smooth_gradient_no_discontinuities() {
        let g = generator(42);
        let step = 0.05;
        let max_delta = g.max_height() * 0.05;
        for i in 0..5000 {
            let x = i as f64 * step;
            let d = (g.sample_height(x + step, 13.0) - g.sample_height(x, 13.0)).abs();
            assert!(d < max_delta, "discontinuity at x={x}: {d}");
        }
    }

    #[test]
    fn test_peak_mask_zero_below_threshold() {
        let g = HeightFieldGenerator::new(
            5,
            HeightParams {
                peak_mask_threshold: 1.0,
                ..HeightParams::default()
            },
        );
        for i in 0..100 {
            let l = g.sample_layers(i as f64 * 97.0, i as f64 * 13.0);
            assert_eq!(l.peak_mask, 0.0);
            assert_eq!(l.peaks, 0.0);
        }
    }

    #[test]
    fn test_layers_compose_to_height() {
        let g = generator(8);
        let p = g.params().clone();
        for i in 0..100 {
            let (x, z) = (i as f64 * 71.0, i as f64 * -29.0);
            let l = g.sample_layers(x, z);
            let expected = ((l.hills + l.mountains * l.mountain_mask)
                + l.peaks * l.peak_mask
                + l.continent * p.continent_height
                + p.sea_level_offset)
                .max(p.min_height);
            assert_eq!(g.sample_height(x, z), expected);
            assert!((0.0..=1.0).contains(&l.continent));
            assert!((0.0..=1.0).contains(&l.mountain_mask));
        }
    }

    #[test]
    fn test_max_height_matches_geometric_sum() {
        let params = HeightParams {
            hills_amplitude: 2.0,
            mountain_amplitude: 1000.0,
            persistence: 0.5,
            octaves: 4,
            peak_amplitude: 10.0,
            continent_height: 5.0,
            sea_level_offset: -1.0,
            ..HeightParams::default()
        };
        let g = HeightFieldGenerator::new(0, params);
        // 3 (hills) + 1875 (fbm) + 10 + 5 - 1
        assert!((g.max_height() - 1892.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_range() {
        let g = generator(1);
        assert_eq!(g.normalize(g.params().min_height), 0.0);
        assert_eq!(g.normalize(g.max_height()), 1.0);
        assert_eq!(g.normalize(-1e9), 0.0);
        let mid = g.normalize((g.params().min_height + g.max_height()) * 0.5);
        assert!((mid - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        assert_eq!(smoothstep(1.0, 0.0, 0.0), 1.0);
        assert_eq!(smoothstep(0.3, 0.3, 0.2), 0.0);
    }
}
