//! Per-vertex terrain coloring.

use glam::Vec3;

use crate::region::BiomeSample;
use crate::seed::position_hash;

/// A height color stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorLayer {
    /// Normalized height in `[0, 1]`.
    pub height: f32,
    /// Linear RGB.
    pub color: Vec3,
    /// How strongly the layer overrides the biome color, in `[0, 1]`.
    pub weight: f32,
}

/// Converts `(height, biome blend)` into a color.
///
/// 1. The biome's low and high altitude colors are blended by a smoothstep
///    of the normalized height.
/// 2. The result is pulled toward the interpolated color layer by the
///    layer's weight.
/// 3. A position hash perturbs brightness and saturation by at most
///    `variation_strength`.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorCompositor {
    layers: Vec<ColorLayer>,
    variation_strength: f32,
}

impl ColorCompositor {
    /// Layers may be given in any order; they are sorted by height.
    pub fn new(mut layers: Vec<ColorLayer>, variation_strength: f32) -> Self {
        layers.sort_by(|a, b| a.height.total_cmp(&b.height));
        Self {
            layers,
            variation_strength: variation_strength.max(0.0),
        }
    }

    pub fn layers(&self) -> &[ColorLayer] {
        &self.layers
    }

    /// Color at a world position with the given normalized height.
    pub fn color(
        &self,
        world_x: f64,
        world_z: f64,
        normalized_height: f32,
        biome: &BiomeSample,
    ) -> Vec3 {
        let base = self.base_color(normalized_height, biome);
        self.apply_variation(base, world_x, world_z)
    }

    /// Color before the positional variation is applied.
    pub fn base_color(&self, normalized_height: f32, biome: &BiomeSample) -> Vec3 {
        let h = normalized_height.clamp(0.0, 1.0);
        let t = h * h * (3.0 - 2.0 * h);
        let attrs = &biome.attributes;
        let biome_color = attrs.primary_color.lerp(attrs.secondary_color, t);

        match self.layer_at(h) {
            Some((color, weight)) => biome_color.lerp(color, weight.clamp(0.0, 1.0)),
            None => biome_color,
        }
    }

    /// Interpolated `(color, weight)` of the layer table at height `h`.
    fn layer_at(&self, h: f32) -> Option<(Vec3, f32)> {
        let first = self.layers.first()?;
        if h <= first.height {
            return Some((first.color, first.weight));
        }
        for pair in self.layers.windows(2) {
            let (lo, hi) = (&pair[0], &pair[1]);
            if h <= hi.height {
                let span = hi.height - lo.height;
                let t = if span > 0.0 { (h - lo.height) / span } else { 1.0 };
                return Some((
                    lo.color.lerp(hi.color, t),
                    lo.weight + (hi.weight - lo.weight) * t,
                ));
            }
        }
        self.layers.last().map(|l| (l.color, l.weight))
    }

    fn apply_variation(&self, color: Vec3, world_x: f64, world_z: f64) -> Vec3 {
        if self.variation_strength == 0.0 {
            return color;
        }
        let v = position_hash(world_x, world_z) as f32 * self.variation_strength;
        let brightened = color * (1.0 + v);
        let luma = brightened.dot(Vec3::new(0.299, 0.587, 0.114));
        let saturated = Vec3::splat(luma) + (brightened - Vec3::splat(luma)) * (1.0 + v * 0.5);
        saturated.clamp(Vec3::ZERO, Vec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{BlendedAttributes, FallbackWeights, SampleOrigin};

    fn biome(primary: Vec3, secondary: Vec3) -> BiomeSample {
        BiomeSample {
            attributes: BlendedAttributes {
                primary_color: primary,
                secondary_color: secondary,
                height_multiplier: 1.0,
                tree_probability: 0.5,
                water_allowed: true,
            },
            origin: SampleOrigin::Fallback(FallbackWeights {
                grassland: 1.0,
                desert: 0.0,
                tundra: 0.0,
            }),
        }
    }

    fn layer(height: f32, color: f32, weight: f32) -> ColorLayer {
        ColorLayer {
            height,
            color: Vec3::splat(color),
            weight,
        }
    }

    #[test]
    fn test_biome_gradient_without_layers() {
        let c = ColorCompositor::new(Vec::new(), 0.0);
        let b = biome(Vec3::ZERO, Vec3::ONE);
        assert_eq!(c.base_color(0.0, &b), Vec3::ZERO);
        assert_eq!(c.base_color(1.0, &b), Vec3::ONE);
        assert_eq!(c.base_color(0.5, &b), Vec3::splat(0.5));
    }

    #[test]
    fn test_layers_sorted_and_interpolated() {
        let c = ColorCompositor::new(vec![layer(1.0, 1.0, 1.0), layer(0.0, 0.0, 1.0)], 0.0);
        assert_eq!(c.layers()[0].height, 0.0);
        let b = biome(Vec3::splat(0.3), Vec3::splat(0.3));
        // Full-weight layers replace the biome color.
        assert!(c.base_color(0.25, &b).abs_diff_eq(Vec3::splat(0.25), 1e-6));
    }

    #[test]
    fn test_zero_weight_layer_keeps_biome_color() {
        let c = ColorCompositor::new(vec![layer(0.0, 1.0, 0.0), layer(1.0, 1.0, 0.0)], 0.0);
        let b = biome(Vec3::new(0.2, 0.4, 0.1), Vec3::new(0.2, 0.4, 0.1));
        assert_eq!(c.base_color(0.6, &b), Vec3::new(0.2, 0.4, 0.1));
    }

    #[test]
    fn test_variation_bounded_and_reproducible() {
        let c = ColorCompositor::new(Vec::new(), 0.1);
        let b = biome(Vec3::splat(0.5), Vec3::splat(0.5));
        for i in 0..200 {
            let (x, z) = (i as f64 * 1.37, i as f64 * -2.11);
            let col = c.color(x, z, 0.4, &b);
            assert_eq!(col, c.color(x, z, 0.4, &b));
            assert!((col - Vec3::splat(0.5)).abs().max_element() <= 0.05 + 1e-6);
            assert!(col.min_element() >= 0.0 && col.max_element() <= 1.0);
        }
    }
}
