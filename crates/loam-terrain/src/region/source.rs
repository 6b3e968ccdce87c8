//! The biome provider handed to workers and the query surface.

use std::sync::Arc;

use super::fallback::{FallbackBiomes, FallbackWeights};
use super::snapshot::{BlendedAttributes, RegionQuery, RegionSnapshot};

/// Where a [`BiomeSample`] came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SampleOrigin {
    Region(RegionQuery),
    Fallback(FallbackWeights),
}

/// Biome attributes at one world position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSample {
    pub attributes: BlendedAttributes,
    pub origin: SampleOrigin,
}

impl BiomeSample {
    /// Whether vegetation may be placed here at all.
    pub fn trees_allowed(&self) -> bool {
        self.attributes.tree_probability > 0.0
    }

    pub fn height_multiplier(&self) -> f64 {
        self.attributes.height_multiplier as f64
    }
}

/// A cheaply clonable, immutable biome provider.
#[derive(Clone, Debug)]
pub enum BiomeSource {
    /// Region snapshot lookup with boundary blending.
    Regions(Arc<RegionSnapshot>),
    /// Temperature/moisture blend, used when no region system is available.
    Fallback(Arc<FallbackBiomes>),
}

impl BiomeSource {
    /// Samples the biome at a world position. Defined everywhere, including
    /// areas no chunk has ever been generated for.
    pub fn sample(&self, world_x: f64, world_z: f64) -> BiomeSample {
        match self {
            BiomeSource::Regions(snapshot) => {
                let q = snapshot.query(world_x, world_z);
                BiomeSample {
                    attributes: snapshot.attributes(&q),
                    origin: SampleOrigin::Region(q),
                }
            }
            BiomeSource::Fallback(fallback) => {
                let w = fallback.weights(world_x, world_z);
                BiomeSample {
                    attributes: fallback.attributes(&w),
                    origin: SampleOrigin::Fallback(w),
                }
            }
        }
    }

    /// Shorthand for `sample(x, z).trees_allowed()`.
    pub fn trees_allowed(&self, world_x: f64, world_z: f64) -> bool {
        self.sample(world_x, world_z).trees_allowed()
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, BiomeSource::Fallback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{RegionMap, RegionParams};

    #[test]
    fn test_region_source_reports_query() {
        let map = RegionMap::generate(42, RegionParams::default(), Vec::new());
        let source = BiomeSource::Regions(map.snapshot());
        let s = source.sample(100.0, 200.0);
        assert!(matches!(s.origin, SampleOrigin::Region(_)));
        assert!(!source.is_fallback());
        assert_eq!(s, source.sample(100.0, 200.0));
    }

    #[test]
    fn test_fallback_source() {
        let source = BiomeSource::Fallback(Arc::new(FallbackBiomes::new(42)));
        let s = source.sample(-5000.0, 7000.0);
        assert!(matches!(s.origin, SampleOrigin::Fallback(_)));
        assert!(source.is_fallback());
        assert!(s.height_multiplier() > 0.0);
    }
}
