//! Heightfield triangulation in flat-shaded and indexed modes.
//!
//! Both modes split every grid quad along a diagonal chosen by the parity of
//! `ix + iz`, so the two LOD styles agree on triangle layout:
//!
//! ```text
//!   even            odd
//!  01---11        01---11
//!  | \   |        |   / |
//!  |   \ |        | /   |
//!  00---10        00---10
//! ```

use glam::Vec3;
use loam_lod::LodLevel;
use loam_terrain::{BiomeSource, ColorCompositor, HeightFieldGenerator, HeightGrid};

use crate::mesh_data::{MeshData, Shading};

/// Corner sample offsets of the two triangles of quad `(ix, iz)`, wound so
/// that face normals point up (+Y).
#[inline]
pub fn quad_triangles(ix: usize, iz: usize) -> [[(usize, usize); 3]; 2] {
    let c00 = (ix, iz);
    let c10 = (ix + 1, iz);
    let c01 = (ix, iz + 1);
    let c11 = (ix + 1, iz + 1);
    if (ix + iz) % 2 == 0 {
        [[c00, c01, c11], [c00, c11, c10]]
    } else {
        [[c00, c01, c10], [c10, c01, c11]]
    }
}

/// Turns height grids into [`MeshData`], coloring from the biome source.
pub struct MeshBuilder<'a> {
    generator: &'a HeightFieldGenerator,
    biomes: &'a BiomeSource,
    compositor: &'a ColorCompositor,
}

impl<'a> MeshBuilder<'a> {
    pub fn new(
        generator: &'a HeightFieldGenerator,
        biomes: &'a BiomeSource,
        compositor: &'a ColorCompositor,
    ) -> Self {
        Self {
            generator,
            biomes,
            compositor,
        }
    }

    /// Flat-shaded for High LOD, indexed otherwise.
    pub fn build(&self, grid: &HeightGrid, lod: LodLevel) -> MeshData {
        if lod.is_high() {
            self.flat(grid)
        } else {
            self.indexed(grid)
        }
    }

    fn local_position(grid: &HeightGrid, (ix, iz): (usize, usize)) -> Vec3 {
        let local = grid.local_position(ix, iz);
        Vec3::new(local.x as f32, grid.get(ix, iz), local.y as f32)
    }

    fn color_at(&self, grid: &HeightGrid, local: Vec3) -> Vec3 {
        let origin = grid.origin();
        let world_x = origin.x + local.x as f64;
        let world_z = origin.y + local.z as f64;
        let biome = self.biomes.sample(world_x, world_z);
        let normalized = self.generator.normalize(local.y as f64) as f32;
        self.compositor.color(world_x, world_z, normalized, &biome)
    }

    /// Three unique vertices per triangle. Each triangle carries its own
    /// face normal and a single color evaluated at its centroid.
    ///
    /// Produces `(size - 1)^2 * 6` vertices.
    pub fn flat(&self, grid: &HeightGrid) -> MeshData {
        let quads = grid.size() - 1;
        let vertex_count = quads * quads * 6;
        let mut mesh = MeshData::with_capacity(Shading::Flat, vertex_count, vertex_count);

        for iz in 0..quads {
            for ix in 0..quads {
                for tri in quad_triangles(ix, iz) {
                    let [a, b, c] = tri.map(|corner| Self::local_position(grid, corner));
                    let normal = (b - a).cross(c - a).try_normalize().unwrap_or(Vec3::Y);
                    let color = self.color_at(grid, (a + b + c) / 3.0);
                    for p in [a, b, c] {
                        let index = mesh.push_vertex(p, normal, color);
                        mesh.indices.push(index);
                    }
                }
            }
        }

        mesh
    }

    /// One shared vertex per sample. Vertex normals are the normalized sum
    /// of the face normals of every triangle touching the vertex; border
    /// vertices simply have fewer contributors.
    pub fn indexed(&self, grid: &HeightGrid) -> MeshData {
        let size = grid.size();
        let quads = size - 1;
        let mut mesh = MeshData::with_capacity(Shading::Smooth, size * size, quads * quads * 6);

        let positions: Vec<Vec3> = (0..size)
            .flat_map(|iz| (0..size).map(move |ix| (ix, iz)))
            .map(|corner| Self::local_position(grid, corner))
            .collect();
        let index_of = |(ix, iz): (usize, usize)| (iz * size + ix) as u32;

        let mut normals = vec![Vec3::ZERO; positions.len()];
        for iz in 0..quads {
            for ix in 0..quads {
                for tri in quad_triangles(ix, iz) {
                    let [ia, ib, ic] = tri.map(index_of);
                    let (a, b, c) = (
                        positions[ia as usize],
                        positions[ib as usize],
                        positions[ic as usize],
                    );
                    let face = (b - a).cross(c - a);
                    for i in [ia, ib, ic] {
                        normals[i as usize] += face;
                    }
                    mesh.indices.extend_from_slice(&[ia, ib, ic]);
                }
            }
        }

        for (p, n) in positions.iter().zip(&normals) {
            let normal = n.try_normalize().unwrap_or(Vec3::Y);
            mesh.push_vertex(*p, normal, self.color_at(grid, *p));
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_coords::ChunkCoord;
    use loam_terrain::{ColorLayer, FallbackBiomes, HeightParams};
    use std::sync::Arc;

    struct Fixture {
        generator: HeightFieldGenerator,
        biomes: BiomeSource,
        compositor: ColorCompositor,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                generator: HeightFieldGenerator::new(42, HeightParams::default()),
                biomes: BiomeSource::Fallback(Arc::new(FallbackBiomes::new(42))),
                compositor: ColorCompositor::new(
                    vec![ColorLayer {
                        height: 0.5,
                        color: Vec3::new(0.4, 0.4, 0.4),
                        weight: 0.3,
                    }],
                    0.05,
                ),
            }
        }

        fn builder(&self) -> MeshBuilder<'_> {
            MeshBuilder::new(&self.generator, &self.biomes, &self.compositor)
        }

        fn grid(&self, coord: ChunkCoord, size: usize) -> HeightGrid {
            HeightGrid::generate(coord, size, 120.0, &self.generator, &self.biomes)
        }
    }

    /// Plane `h = slope * local_x` sampled on a `size x size` grid.
    fn sloped_grid(size: usize, world: f64, slope: f32) -> HeightGrid {
        let cell = (world / (size - 1) as f64) as f32;
        let heights = (0..size * size)
            .map(|i| (i % size) as f32 * cell * slope)
            .collect();
        HeightGrid::from_heights(ChunkCoord::new(0, 0), size, world, heights)
    }

    #[test]
    fn test_flat_vertex_count_and_validity() {
        let f = Fixture::new();
        let grid = f.grid(ChunkCoord::new(0, 0), 17);
        let mesh = f.builder().flat(&grid);
        assert_eq!(mesh.vertex_count(), 16 * 16 * 6);
        assert_eq!(mesh.triangle_count(), 16 * 16 * 2);
        assert_eq!(mesh.shading, Shading::Flat);
        assert_eq!(mesh.validate(), Ok(()));
    }

    #[test]
    fn test_flat_triangles_are_uniform_units() {
        let f = Fixture::new();
        let mesh = f.builder().flat(&f.grid(ChunkCoord::new(2, -1), 9));
        for t in 0..mesh.triangle_count() {
            let v = t * 3;
            assert_eq!(mesh.normals[v], mesh.normals[v + 1]);
            assert_eq!(mesh.normals[v], mesh.normals[v + 2]);
            assert_eq!(mesh.colors[v], mesh.colors[v + 2]);
            let expected = mesh.face_normal(t).normalize();
            assert!(Vec3::from_array(mesh.normals[v]).abs_diff_eq(expected, 1e-5));
        }
    }

    #[test]
    fn test_diagonal_alternates_with_parity() {
        assert_eq!(quad_triangles(0, 0), [[(0, 0), (0, 1), (1, 1)], [(0, 0), (1, 1), (1, 0)]]);
        assert_eq!(quad_triangles(1, 0), [[(1, 0), (1, 1), (2, 0)], [(2, 0), (1, 1), (2, 1)]]);
        assert_eq!(quad_triangles(1, 1)[0][2], (2, 2));
    }

    #[test]
    fn test_all_windings_point_up() {
        for iz in 0..2 {
            for ix in 0..2 {
                for tri in quad_triangles(ix, iz) {
                    let [a, b, c] =
                        tri.map(|(x, z)| Vec3::new(x as f32, 0.0, z as f32));
                    assert!((b - a).cross(c - a).y > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_indexed_counts_and_validity() {
        let f = Fixture::new();
        let grid = f.grid(ChunkCoord::new(0, 0), 31);
        let mesh = f.builder().indexed(&grid);
        assert_eq!(mesh.vertex_count(), 31 * 31);
        assert_eq!(mesh.indices.len(), 30 * 30 * 6);
        assert_eq!(mesh.shading, Shading::Smooth);
        assert_eq!(mesh.validate(), Ok(()));
        for n in &mesh.normals {
            assert!((Vec3::from_array(*n).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_indexed_normals_on_plane() {
        let f = Fixture::new();
        let mesh = f.builder().indexed(&sloped_grid(5, 40.0, 1.0));
        let expected = Vec3::new(-1.0, 1.0, 0.0).normalize();
        for n in &mesh.normals {
            assert!(Vec3::from_array(*n).abs_diff_eq(expected, 1e-5), "{n:?}");
        }
        let flat = f.builder().indexed(&sloped_grid(5, 40.0, 0.0));
        assert!(flat.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_indexed_positions_match_grid() {
        let f = Fixture::new();
        let grid = f.grid(ChunkCoord::new(-3, 4), 7);
        let mesh = f.builder().indexed(&grid);
        for iz in 0..7 {
            for ix in 0..7 {
                let p = mesh.positions[iz * 7 + ix];
                assert_eq!(p[1], grid.get(ix, iz));
                assert!((p[0] as f64 - ix as f64 * grid.cell_size()).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_build_dispatches_on_lod() {
        let f = Fixture::new();
        let grid = f.grid(ChunkCoord::new(0, 0), 5);
        assert_eq!(f.builder().build(&grid, LodLevel::High).shading, Shading::Flat);
        assert_eq!(f.builder().build(&grid, LodLevel::Medium).shading, Shading::Smooth);
        assert_eq!(f.builder().build(&grid, LodLevel::Low).vertex_count(), 25);
    }

    #[test]
    fn test_shared_edge_vertices_agree_between_chunks() {
        let f = Fixture::new();
        let a = f.grid(ChunkCoord::new(0, 0), 9);
        let b = f.grid(ChunkCoord::new(1, 0), 9);
        let ma = f.builder().indexed(&a);
        let mb = f.builder().indexed(&b);
        for iz in 0..9 {
            let pa = ma.positions[iz * 9 + 8];
            let pb = mb.positions[iz * 9];
            assert_eq!(pa[1], pb[1]);
            assert_eq!(pa[2], pb[2]);
            assert_eq!(ma.colors[iz * 9 + 8], mb.colors[iz * 9]);
        }
    }
}
