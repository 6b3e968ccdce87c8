//! Degraded biome mode: a temperature/moisture noise pair blends three
//! fixed profiles when no region system is available.

use glam::Vec3;

use super::def::SubBiome;
use super::snapshot::BlendedAttributes;
use crate::heightfield::smoothstep;
use crate::noise_field::NoiseField;

const TEMPERATURE_SALT: u64 = 21;
const MOISTURE_SALT: u64 = 22;
const GRASSLAND_FLOOR: f64 = 0.05;

/// Normalized blend weights of the three fallback profiles. Sums to one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallbackWeights {
    pub grassland: f64,
    pub desert: f64,
    pub tundra: f64,
}

/// Temperature/moisture-driven grassland/desert/tundra blend.
#[derive(Clone, Debug)]
pub struct FallbackBiomes {
    temperature: NoiseField,
    moisture: NoiseField,
    /// Frequency of the temperature field, in cycles per world unit.
    pub temperature_frequency: f64,
    /// Frequency of the moisture field, in cycles per world unit.
    pub moisture_frequency: f64,
    grassland: BlendedAttributes,
    desert: BlendedAttributes,
    tundra: BlendedAttributes,
}

fn profile(primary: [f32; 3], secondary: [f32; 3], height: f32, trees: f32, water: bool) -> BlendedAttributes {
    BlendedAttributes::from_sub_biome(&SubBiome {
        name: String::new(),
        weight: 1.0,
        primary_color: Vec3::from_array(primary),
        secondary_color: Vec3::from_array(secondary),
        height_multiplier: height,
        tree_probability: trees,
        water_allowed: water,
    })
}

impl FallbackBiomes {
    /// Creates the fallback blend for a world seed. Temperature and moisture
    /// use decorrelated fields derived from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            temperature: NoiseField::derived(seed, TEMPERATURE_SALT),
            moisture: NoiseField::derived(seed, MOISTURE_SALT),
            temperature_frequency: 0.0015,
            moisture_frequency: 0.002,
            grassland: profile([0.32, 0.52, 0.22], [0.46, 0.44, 0.34], 1.0, 0.5, true),
            desert: profile([0.84, 0.72, 0.46], [0.74, 0.56, 0.36], 0.7, 0.02, false),
            tundra: profile([0.58, 0.62, 0.58], [0.92, 0.93, 0.96], 0.9, 0.08, true),
        }
    }

    /// Raw `(temperature, moisture)` in `[0, 1]`.
    pub fn climate(&self, world_x: f64, world_z: f64) -> (f64, f64) {
        let tf = self.temperature_frequency;
        let mf = self.moisture_frequency;
        (
            self.temperature.sample(world_x * tf, world_z * tf),
            self.moisture.sample(world_x * mf, world_z * mf),
        )
    }

    /// Profile weights at a world position.
    pub fn weights(&self, world_x: f64, world_z: f64) -> FallbackWeights {
        let (t, m) = self.climate(world_x, world_z);
        let desert = smoothstep(0.55, 0.75, t) * (1.0 - m);
        let tundra = smoothstep(0.45, 0.25, t);
        let grassland = (1.0 - desert - tundra).max(GRASSLAND_FLOOR);
        let total = grassland + desert + tundra;
        FallbackWeights {
            grassland: grassland / total,
            desert: desert / total,
            tundra: tundra / total,
        }
    }

    /// Attributes blended by [`weights`](Self::weights).
    pub fn attributes(&self, weights: &FallbackWeights) -> BlendedAttributes {
        let (g, d, t) = (
            weights.grassland as f32,
            weights.desert as f32,
            weights.tundra as f32,
        );
        let mix = |a: Vec3, b: Vec3, c: Vec3| a * g + b * d + c * t;
        let water_allowed = if d >= g && d >= t {
            self.desert.water_allowed
        } else if t >= g {
            self.tundra.water_allowed
        } else {
            self.grassland.water_allowed
        };

        BlendedAttributes {
            primary_color: mix(
                self.grassland.primary_color,
                self.desert.primary_color,
                self.tundra.primary_color,
            ),
            secondary_color: mix(
                self.grassland.secondary_color,
                self.desert.secondary_color,
                self.tundra.secondary_color,
            ),
            height_multiplier: self.grassland.height_multiplier * g
                + self.desert.height_multiplier * d
                + self.tundra.height_multiplier * t,
            tree_probability: self.grassland.tree_probability * g
                + self.desert.tree_probability * d
                + self.tundra.tree_probability * t,
            water_allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_normalized() {
        let f = FallbackBiomes::new(42);
        for i in 0..400 {
            let w = f.weights(i as f64 * 97.0 - 20_000.0, i as f64 * 53.0);
            let sum = w.grassland + w.desert + w.tundra;
            assert!((sum - 1.0).abs() < 1e-9, "sum {sum}");
            assert!(w.grassland > 0.0);
            assert!(w.desert >= 0.0 && w.tundra >= 0.0);
        }
    }

    #[test]
    fn test_all_profiles_reachable() {
        let f = FallbackBiomes::new(7);
        let (mut desert, mut tundra, mut grass) = (false, false, false);
        for i in 0..200 {
            for j in 0..200 {
                let w = f.weights(i as f64 * 150.0, j as f64 * 150.0);
                desert |= w.desert > 0.5;
                tundra |= w.tundra > 0.5;
                grass |= w.grassland > 0.9;
            }
        }
        assert!(desert && tundra && grass);
    }

    #[test]
    fn test_pure_profile_attributes() {
        let f = FallbackBiomes::new(1);
        let a = f.attributes(&FallbackWeights {
            grassland: 0.0,
            desert: 1.0,
            tundra: 0.0,
        });
        assert_eq!(a.tree_probability, 0.02);
        assert!(!a.water_allowed);
    }

    #[test]
    fn test_deterministic() {
        let a = FallbackBiomes::new(3);
        let b = FallbackBiomes::new(3);
        assert_eq!(a.weights(10.0, 20.0), b.weights(10.0, 20.0));
    }
}
