//! Tick-driven chunk streaming.
//!
//! [`ChunkStreamer`] keeps the square of chunks around a moving viewer
//! generated at the level of detail its distance calls for. Each
//! [`tick`](ChunkStreamer::tick):
//!
//! 1. On a viewer chunk change, tears down chunks beyond render distance,
//!    queues new chunks for creation and queues LOD changes.
//! 2. Submits creation and LOD tasks to the worker pool, nearest first,
//!    within the per-tick budgets.
//! 3. Applies completed results whose generation token is still current,
//!    nearest first, within the apply budget.
//! 4. Finalizes High LOD colliders whose deferral has elapsed.
//!
//! Nothing here blocks on the workers.

use std::sync::Arc;

use glam::DVec3;
use loam_coords::{ChunkCoord, chunks_within};
use loam_lod::{LodLevel, ProximityQueue};
use loam_mesh::{
    GenerationPipeline, GenerationResult, GenerationTask, MeshData, default_worker_count,
};
use loam_terrain::{
    BiomeSample, BiomeSource, ChunkTrees, ColorCompositor, FallbackBiomes, HeightFieldGenerator,
    HeightGrid, RegionMap, TreePlacement, TreeScatterer, terrain_height,
};
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::events::{StreamEvent, TickReport};
use crate::settings::{StreamerSettings, WorldSettings};

/// Lifecycle state of a tracked chunk. Chunks outside render distance
/// are not tracked at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Waiting in the creation queue; nothing submitted yet.
    QueuedForCreation,
    /// A task for this LOD is with the workers.
    Generating(LodLevel),
    /// Displaying a mesh at this LOD, which matches the requirement.
    Active(LodLevel),
    /// Displaying a mesh at this LOD while waiting to be regenerated.
    PendingLodUpdate(LodLevel),
}

/// Deferred collider step of a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColliderState {
    None,
    Pending { token: u64, due_tick: u64 },
    Ready { token: u64 },
}

struct ChunkEntry {
    state: ChunkState,
    /// LOD the viewer distance currently calls for.
    target_lod: LodLevel,
    /// Token of the latest submitted task; `0` before the first.
    token: u64,
    /// Set when the chunk must be (re)submitted from the LOD queue.
    regenerate: bool,
    /// Set when the biome source changed under the displayed mesh.
    inputs_stale: bool,
    /// LOD of the mesh in `mesh`.
    displayed: Option<LodLevel>,
    mesh: Option<Arc<MeshData>>,
    heights: Option<Arc<HeightGrid>>,
    trees: ChunkTrees,
    collider: ColliderState,
}

impl ChunkEntry {
    fn new(coord: ChunkCoord, target_lod: LodLevel, chunk_world_size: f64) -> Self {
        Self {
            state: ChunkState::QueuedForCreation,
            target_lod,
            token: 0,
            regenerate: false,
            inputs_stale: false,
            displayed: None,
            mesh: None,
            heights: None,
            trees: ChunkTrees::empty(coord, coord.origin(chunk_world_size)),
            collider: ColliderState::None,
        }
    }

    /// Updates the required LOD. Returns whether the chunk now needs a
    /// regeneration task.
    fn retarget(&mut self, target: LodLevel) -> bool {
        self.target_lod = target;
        match self.state {
            ChunkState::QueuedForCreation => {}
            ChunkState::Generating(lod) => {
                self.regenerate = lod != target || self.inputs_stale;
            }
            ChunkState::Active(lod) => {
                if lod != target {
                    self.state = ChunkState::PendingLodUpdate(lod);
                    self.regenerate = true;
                }
            }
            ChunkState::PendingLodUpdate(lod) => {
                if lod == target && !self.inputs_stale {
                    self.state = ChunkState::Active(lod);
                    self.regenerate = false;
                }
            }
        }
        self.regenerate
    }

    /// Flags the chunk for regeneration against new biome data. Returns
    /// whether it needs a task from the LOD queue.
    fn invalidate(&mut self) -> bool {
        match self.state {
            ChunkState::QueuedForCreation => return false,
            ChunkState::Generating(_) => {}
            ChunkState::Active(lod) => self.state = ChunkState::PendingLodUpdate(lod),
            ChunkState::PendingLodUpdate(_) => {}
        }
        self.inputs_stale = true;
        self.regenerate = true;
        true
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingCollider {
    coord: ChunkCoord,
    token: u64,
    due_tick: u64,
}

/// Streams terrain chunks around a viewer.
pub struct ChunkStreamer {
    settings: StreamerSettings,
    generator: Arc<HeightFieldGenerator>,
    compositor: Arc<ColorCompositor>,
    regions: Option<RegionMap>,
    biomes: BiomeSource,
    scatterer: TreeScatterer,
    pipeline: GenerationPipeline,
    chunks: FxHashMap<ChunkCoord, ChunkEntry>,
    create_queue: ProximityQueue,
    lod_queue: ProximityQueue,
    /// Valid results waiting for apply budget.
    pending_results: Vec<GenerationResult>,
    colliders: Vec<PendingCollider>,
    events: Vec<StreamEvent>,
    viewer_chunk: Option<ChunkCoord>,
    /// Last issued generation token. Shared by every chunk so a token is
    /// never reused, even by a chunk that was removed and re-created.
    last_token: u64,
    tick: u64,
}

impl ChunkStreamer {
    /// Builds the terrain generators for `world` and starts the worker pool.
    ///
    /// Without region settings the streamer runs on the fallback biome
    /// blend and says so in the log.
    pub fn new(world: WorldSettings, settings: StreamerSettings) -> Self {
        let generator = Arc::new(HeightFieldGenerator::new(world.seed, world.height));
        let compositor = Arc::new(ColorCompositor::new(
            world.color_layers,
            world.color_variation,
        ));
        let regions = world
            .regions
            .map(|r| RegionMap::generate(world.seed, r.params, r.biomes));
        let biomes = match &regions {
            Some(map) => BiomeSource::Regions(map.snapshot()),
            None => {
                warn!("Region system unavailable, using the fallback biome blend");
                BiomeSource::Fallback(Arc::new(FallbackBiomes::new(world.seed)))
            }
        };
        let workers = match settings.worker_threads {
            0 => default_worker_count(),
            n => n,
        };

        info!(
            seed = world.seed,
            render_distance = settings.max_render_distance,
            high = settings.bands.high_distance(),
            medium = settings.bands.medium_distance(),
            workers,
            fallback = biomes.is_fallback(),
            "Chunk streamer initialized"
        );

        Self {
            pipeline: GenerationPipeline::new(workers),
            scatterer: TreeScatterer::new(world.trees),
            settings,
            generator,
            compositor,
            regions,
            biomes,
            chunks: FxHashMap::default(),
            create_queue: ProximityQueue::new(),
            lod_queue: ProximityQueue::new(),
            pending_results: Vec::new(),
            colliders: Vec::new(),
            events: Vec::new(),
            viewer_chunk: None,
            last_token: 0,
            tick: 0,
        }
    }

    /// Advances the streamer by one tick for a viewer at `viewer`.
    pub fn tick(&mut self, viewer: DVec3) -> TickReport {
        self.tick += 1;
        let viewer_chunk = ChunkCoord::from_world(viewer, self.settings.chunk_world_size);
        let mut report = TickReport {
            tick: self.tick,
            viewer_chunk,
            ..TickReport::default()
        };

        // --- Step 1: Recompute the required set when the viewer changes chunk ---
        if self.viewer_chunk != Some(viewer_chunk) {
            self.viewer_chunk = Some(viewer_chunk);
            report.viewer_moved = true;
            report.removed = self.update_required_set(viewer_chunk);
        }

        // --- Step 2: Dispatch creation and LOD tasks ---
        for _ in 0..self.settings.max_new_chunks_per_tick {
            let Some(coord) = self.next_creation() else {
                break;
            };
            self.submit(coord);
            report.created += 1;
        }
        for _ in 0..self.settings.max_lod_updates_per_tick {
            let Some(coord) = self.next_lod_update() else {
                break;
            };
            self.submit(coord);
            report.lod_updates += 1;
        }

        // --- Step 3: Apply completed results ---
        let incoming = self.pipeline.drain_results();
        self.pending_results.extend(incoming);
        report.stale_dropped = self.drop_stale_results();
        report.meshes_applied = self.apply_results(viewer_chunk);
        report.pending_results = self.pending_results.len() as u32;

        // --- Step 4: Finalize due colliders ---
        let (ready, cancelled) = self.finalize_colliders();
        report.colliders_ready = ready;
        report.colliders_cancelled = cancelled;

        report.tracked_chunks = self.chunks.len() as u32;
        report
    }

    /// Hands a completed result to the streamer as if a worker had
    /// produced it. It goes through the same liveness and token checks.
    pub fn deliver(&mut self, result: GenerationResult) {
        self.pending_results.push(result);
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<StreamEvent> {
        std::mem::take(&mut self.events)
    }

    /// Regenerates regions for `seed`, publishes the new snapshot to the
    /// workers and queues every live chunk for regeneration.
    ///
    /// Returns `false` when the streamer runs on the fallback blend.
    pub fn refresh_regions(&mut self, seed: u64) -> bool {
        let Some(map) = &self.regions else {
            warn!(seed, "Region refresh requested but no region map is loaded");
            return false;
        };
        self.biomes = BiomeSource::Regions(map.rebuild(seed));

        let mut queued = 0usize;
        if let Some(viewer_chunk) = self.viewer_chunk {
            for (&coord, entry) in self.chunks.iter_mut() {
                if entry.invalidate() {
                    self.lod_queue.push(coord, viewer_chunk);
                    queued += 1;
                }
            }
        }
        info!(seed, chunks = queued, "Regions refreshed, regenerating live chunks");
        true
    }

    /// Removes the tree closest to `point` within `max_distance`, searching
    /// every tracked chunk the distance can reach.
    pub fn remove_tree_near(
        &mut self,
        point: DVec3,
        max_distance: f64,
    ) -> Option<(ChunkCoord, TreePlacement)> {
        let size = self.settings.chunk_world_size;
        let center = ChunkCoord::from_world(point, size);
        let reach = (max_distance / size).ceil().max(1.0) as u32;
        let limit_sq = max_distance * max_distance;

        let mut best: Option<(ChunkCoord, f64)> = None;
        for (&coord, entry) in &self.chunks {
            if coord.chebyshev_distance(center) > reach {
                continue;
            }
            for i in 0..entry.trees.len() {
                let Some(pos) = entry.trees.world_position(i) else {
                    continue;
                };
                let d = pos.distance_squared(point);
                if d <= limit_sq && best.is_none_or(|(_, b)| d < b) {
                    best = Some((coord, d));
                }
            }
        }

        let (coord, _) = best?;
        let entry = self.chunks.get_mut(&coord)?;
        let (_, placement) = entry.trees.remove_nearest(point, max_distance)?;
        self.events.push(StreamEvent::TreesChanged {
            coord,
            count: entry.trees.len(),
        });
        debug!(chunk = %coord, remaining = entry.trees.len(), "Tree removed");
        Some((coord, placement))
    }

    // --- Queries ---

    /// Biome attributes at any world position, generated or not.
    pub fn biome_at(&self, world_x: f64, world_z: f64) -> BiomeSample {
        self.biomes.sample(world_x, world_z)
    }

    /// Terrain height at any world position. Matches the heights chunk
    /// grids sample at their vertices.
    pub fn terrain_height(&self, world_x: f64, world_z: f64) -> f64 {
        terrain_height(&self.generator, &self.biomes, world_x, world_z)
    }

    /// Whether the biome at a world position accepts trees.
    pub fn trees_allowed(&self, world_x: f64, world_z: f64) -> bool {
        self.biomes.trees_allowed(world_x, world_z)
    }

    /// Lifecycle state of a tracked chunk.
    pub fn chunk_state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.chunks.get(&coord).map(|e| e.state)
    }

    /// LOD the chunk should be displayed at for the current viewer.
    pub fn target_lod(&self, coord: ChunkCoord) -> Option<LodLevel> {
        self.chunks.get(&coord).map(|e| e.target_lod)
    }

    /// Current generation token of a tracked chunk.
    pub fn chunk_token(&self, coord: ChunkCoord) -> Option<u64> {
        self.chunks.get(&coord).map(|e| e.token)
    }

    /// Mesh currently displayed for a chunk.
    pub fn chunk_mesh(&self, coord: ChunkCoord) -> Option<Arc<MeshData>> {
        self.chunks.get(&coord).and_then(|e| e.mesh.clone())
    }

    /// Height grid behind the displayed mesh.
    pub fn chunk_heights(&self, coord: ChunkCoord) -> Option<Arc<HeightGrid>> {
        self.chunks.get(&coord).and_then(|e| e.heights.clone())
    }

    /// Trees placed on a chunk.
    pub fn chunk_trees(&self, coord: ChunkCoord) -> Option<&ChunkTrees> {
        self.chunks.get(&coord).map(|e| &e.trees)
    }

    pub fn collider_state(&self, coord: ChunkCoord) -> Option<ColliderState> {
        self.chunks.get(&coord).map(|e| e.collider)
    }

    /// Every tracked coordinate, sorted.
    pub fn tracked_chunks(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<_> = self.chunks.keys().copied().collect();
        coords.sort();
        coords
    }

    /// Number of tracked chunks.
    pub fn tracked_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of chunks displaying a mesh at their required LOD.
    pub fn active_count(&self) -> usize {
        self.chunks
            .values()
            .filter(|e| matches!(e.state, ChunkState::Active(_)))
            .count()
    }

    /// Whether every tracked chunk is active and no work is outstanding.
    pub fn is_settled(&self) -> bool {
        self.create_queue.is_empty()
            && self.lod_queue.is_empty()
            && self.pending_results.is_empty()
            && self.active_count() == self.chunks.len()
    }

    /// Chunk the viewer stood in at the last tick.
    pub fn viewer_chunk(&self) -> Option<ChunkCoord> {
        self.viewer_chunk
    }

    /// Number of ticks run so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn settings(&self) -> &StreamerSettings {
        &self.settings
    }

    /// Height generator shared with the workers.
    pub fn generator(&self) -> &Arc<HeightFieldGenerator> {
        &self.generator
    }

    /// Biome source handed to new tasks.
    pub fn biomes(&self) -> &BiomeSource {
        &self.biomes
    }

    /// Tasks queued or running on the worker pool.
    pub fn in_flight(&self) -> usize {
        self.pipeline.in_flight_count()
    }

    /// Stops the worker pool. Later ticks still tear down and apply
    /// already delivered results, but nothing new is generated.
    pub fn shutdown(&mut self) {
        self.pipeline.shutdown();
        info!(tick = self.tick, chunks = self.chunks.len(), "Chunk streamer shut down");
    }

    // --- Internals ---

    /// Tears down chunks beyond render distance and queues creations and
    /// LOD changes for the new viewer chunk. Returns the number removed.
    fn update_required_set(&mut self, viewer_chunk: ChunkCoord) -> u32 {
        let radius = self.settings.max_render_distance;

        let doomed: Vec<ChunkCoord> = self
            .chunks
            .keys()
            .copied()
            .filter(|c| c.chebyshev_distance(viewer_chunk) > radius)
            .collect();
        for &coord in &doomed {
            self.teardown(coord);
        }

        for coord in chunks_within(viewer_chunk, radius) {
            let target = self.settings.bands.select_for(viewer_chunk, coord);
            match self.chunks.get_mut(&coord) {
                None => {
                    self.chunks.insert(
                        coord,
                        ChunkEntry::new(coord, target, self.settings.chunk_world_size),
                    );
                    self.create_queue.push(coord, viewer_chunk);
                }
                Some(entry) => {
                    if entry.retarget(target) {
                        self.lod_queue.push(coord, viewer_chunk);
                    } else {
                        self.lod_queue.remove(coord);
                    }
                }
            }
        }

        self.create_queue.reprioritize(viewer_chunk);
        self.lod_queue.reprioritize(viewer_chunk);

        debug!(
            viewer = %viewer_chunk,
            removed = doomed.len(),
            create_queue = self.create_queue.len(),
            lod_queue = self.lod_queue.len(),
            "Required chunk set updated"
        );
        doomed.len() as u32
    }

    /// Releases everything a chunk holds. Its in-flight task and pending
    /// collider become unreachable and are dropped when they surface.
    fn teardown(&mut self, coord: ChunkCoord) {
        let Some(entry) = self.chunks.remove(&coord) else {
            return;
        };
        self.create_queue.remove(coord);
        self.lod_queue.remove(coord);
        self.pipeline.forget(coord);
        debug!(chunk = %coord, token = entry.token, trees = entry.trees.len(), "Chunk removed");
        self.events.push(StreamEvent::ChunkRemoved { coord });
    }

    fn next_creation(&mut self) -> Option<ChunkCoord> {
        while let Some(coord) = self.create_queue.pop() {
            if self
                .chunks
                .get(&coord)
                .is_some_and(|e| e.state == ChunkState::QueuedForCreation)
            {
                return Some(coord);
            }
        }
        None
    }

    fn next_lod_update(&mut self) -> Option<ChunkCoord> {
        while let Some(coord) = self.lod_queue.pop() {
            if self.chunks.get(&coord).is_some_and(|e| e.regenerate) {
                return Some(coord);
            }
        }
        None
    }

    /// Advances the chunk's token and hands a task for its target LOD to
    /// the workers.
    fn submit(&mut self, coord: ChunkCoord) {
        let Some(entry) = self.chunks.get_mut(&coord) else {
            return;
        };
        self.last_token += 1;
        entry.token = self.last_token;
        entry.regenerate = false;
        entry.inputs_stale = false;
        let lod = entry.target_lod;
        entry.state = ChunkState::Generating(lod);

        let task = GenerationTask {
            coord,
            lod,
            token: entry.token,
            grid_size: self.settings.grid_sizes.grid_size(lod),
            chunk_world_size: self.settings.chunk_world_size,
            generator: Arc::clone(&self.generator),
            compositor: Arc::clone(&self.compositor),
            biomes: self.biomes.clone(),
        };
        let token = task.token;
        if !self.pipeline.submit(task) {
            warn!(chunk = %coord, token, "Generation pipeline is shut down, task dropped");
        }
    }

    /// Discards buffered results whose chunk is gone or whose token has
    /// advanced. Returns the number discarded.
    fn drop_stale_results(&mut self) -> u32 {
        let chunks = &self.chunks;
        let before = self.pending_results.len();
        self.pending_results.retain(|r| {
            let current = chunks.get(&r.coord).map(|e| e.token);
            if current == Some(r.token) {
                return true;
            }
            debug!(
                chunk = %r.coord,
                token = r.token,
                current = ?current,
                "Dropping stale generation result"
            );
            false
        });
        (before - self.pending_results.len()) as u32
    }

    /// Applies up to the apply budget of buffered results, nearest to the
    /// viewer first. Returns the number applied.
    fn apply_results(&mut self, viewer_chunk: ChunkCoord) -> u32 {
        // Farthest first, so the nearest pop off the back.
        self.pending_results.sort_by(|a, b| {
            b.coord
                .distance_sq(viewer_chunk)
                .cmp(&a.coord.distance_sq(viewer_chunk))
                .then_with(|| b.coord.cmp(&a.coord))
        });

        let mut applied = 0;
        while applied < self.settings.max_mesh_applies_per_tick {
            let Some(result) = self.pending_results.pop() else {
                break;
            };
            self.apply(result);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, result: GenerationResult) {
        let coord = result.coord;
        let lod = result.lod;
        let trees = lod
            .is_high()
            .then(|| self.scatterer.scatter(&result.heights, &self.generator, &self.biomes));

        let Some(entry) = self.chunks.get_mut(&coord) else {
            return;
        };

        entry.state = if entry.regenerate {
            ChunkState::PendingLodUpdate(lod)
        } else {
            ChunkState::Active(lod)
        };

        let had_trees = !entry.trees.is_empty();
        entry.trees.clear();
        match trees {
            Some(trees) => {
                entry.trees = trees;
                self.events.push(StreamEvent::TreesChanged {
                    coord,
                    count: entry.trees.len(),
                });
            }
            None if had_trees => {
                self.events.push(StreamEvent::TreesChanged { coord, count: 0 });
            }
            None => {}
        }

        entry.collider = if lod.is_high() {
            let due_tick = self.tick + self.settings.collider_delay_ticks;
            self.colliders.push(PendingCollider {
                coord,
                token: result.token,
                due_tick,
            });
            ColliderState::Pending {
                token: result.token,
                due_tick,
            }
        } else {
            ColliderState::None
        };

        entry.displayed = Some(lod);
        entry.heights = Some(Arc::clone(&result.heights));
        entry.mesh = Some(Arc::clone(&result.mesh));

        debug!(
            chunk = %coord,
            lod = %lod,
            token = result.token,
            vertices = result.mesh.vertex_count(),
            trees = entry.trees.len(),
            elapsed_us = result.elapsed_us,
            "Chunk mesh applied"
        );
        self.events.push(StreamEvent::MeshReady {
            coord,
            lod,
            token: result.token,
            mesh: result.mesh,
        });
    }

    /// Runs every collider step whose delay has elapsed. A step only
    /// completes if its chunk is still live, still displays High, and has
    /// the token the step was scheduled with.
    fn finalize_colliders(&mut self) -> (u32, u32) {
        let now = self.tick;
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.colliders)
            .into_iter()
            .partition(|c| c.due_tick <= now);
        self.colliders = waiting;

        let mut ready = 0;
        let mut cancelled = 0;
        for step in due {
            let entry = self.chunks.get_mut(&step.coord).filter(|e| {
                e.token == step.token && e.displayed == Some(LodLevel::High)
            });
            let Some(entry) = entry else {
                debug!(chunk = %step.coord, token = step.token, "Collider step cancelled");
                cancelled += 1;
                continue;
            };
            let (Some(heights), Some(mesh)) = (entry.heights.clone(), entry.mesh.clone()) else {
                cancelled += 1;
                continue;
            };
            entry.collider = ColliderState::Ready { token: step.token };
            self.events.push(StreamEvent::ColliderReady {
                coord: step.coord,
                token: step.token,
                heights,
                mesh,
            });
            ready += 1;
        }
        (ready, cancelled)
    }
}

impl Drop for ChunkStreamer {
    fn drop(&mut self) {
        self.pipeline.shutdown();
    }
}

#[cfg(test)]
#[path = "streamer_tests.rs"]
mod tests;
