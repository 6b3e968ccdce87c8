//! Background chunk generation: height sampling, meshing and coloring on a
//! pool of worker threads, with results delivered over channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use dashmap::DashMap;
use loam_coords::ChunkCoord;
use loam_lod::LodLevel;
use loam_terrain::{BiomeSource, ColorCompositor, HeightFieldGenerator, HeightGrid};
use tracing::{debug, info};

use crate::builder::MeshBuilder;
use crate::mesh_data::MeshData;

/// A self-contained request to generate one chunk at one LOD.
///
/// Carries every input by value (shared immutable state behind `Arc`), so
/// it can run on any thread without touching the streamer's chunk table.
#[derive(Clone, Debug)]
pub struct GenerationTask {
    pub coord: ChunkCoord,
    pub lod: LodLevel,
    /// Generation token the result will be stamped with.
    pub token: u64,
    /// Samples per side.
    pub grid_size: usize,
    pub chunk_world_size: f64,
    pub generator: Arc<HeightFieldGenerator>,
    pub compositor: Arc<ColorCompositor>,
    pub biomes: BiomeSource,
}

/// The output of a completed [`GenerationTask`].
#[derive(Clone, Debug)]
pub struct GenerationResult {
    pub coord: ChunkCoord,
    pub lod: LodLevel,
    pub token: u64,
    pub heights: Arc<HeightGrid>,
    pub mesh: Arc<MeshData>,
    /// Generation time in microseconds (for profiling).
    pub elapsed_us: u64,
}

/// Generate a chunk synchronously. This is the CPU-intensive function that
/// runs on worker threads; it is a pure function of the task.
pub fn generate_chunk(task: &GenerationTask) -> GenerationResult {
    let start = std::time::Instant::now();
    let heights = HeightGrid::generate(
        task.coord,
        task.grid_size,
        task.chunk_world_size,
        &task.generator,
        &task.biomes,
    );
    let mesh = MeshBuilder::new(&task.generator, &task.biomes, &task.compositor)
        .build(&heights, task.lod);

    GenerationResult {
        coord: task.coord,
        lod: task.lod,
        token: task.token,
        heights: Arc::new(heights),
        mesh: Arc::new(mesh),
        elapsed_us: start.elapsed().as_micros() as u64,
    }
}

/// Default worker count: all cores but two, at least one.
pub fn default_worker_count() -> usize {
    let cpus = num_cpus::get().max(2);
    (cpus - 2).max(1)
}

/// Asynchronous generation pipeline backed by a thread pool.
///
/// The tick thread submits [`GenerationTask`]s and collects
/// [`GenerationResult`]s with [`drain_results`](Self::drain_results), which
/// never blocks. Workers skip a queued task whose token is no longer the
/// latest one submitted for its chunk; results that were already in flight
/// are still delivered and must be checked by the caller.
pub struct GenerationPipeline {
    task_sender: Option<Sender<GenerationTask>>,
    result_receiver: Receiver<GenerationResult>,
    worker_handles: Vec<JoinHandle<()>>,
    /// Latest submitted token per chunk.
    latest_tokens: Arc<DashMap<ChunkCoord, u64>>,
    in_flight: Arc<AtomicUsize>,
}

impl GenerationPipeline {
    /// Spawns `worker_count` generation threads (at least one).
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_tx, task_rx) = unbounded::<GenerationTask>();
        let (result_tx, result_rx) = unbounded::<GenerationResult>();
        let latest_tokens = Arc::new(DashMap::new());
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            let tokens: Arc<DashMap<ChunkCoord, u64>> = Arc::clone(&latest_tokens);
            let flight = Arc::clone(&in_flight);

            let handle = std::thread::Builder::new()
                .name("chunk-gen-worker".into())
                .spawn(move || {
                    while let Ok(task) = rx.recv() {
                        let latest = tokens.get(&task.coord).map(|t| *t);
                        if latest != Some(task.token) {
                            debug!(coord = %task.coord, token = task.token, "Skipping superseded task");
                            flight.fetch_sub(1, Ordering::Relaxed);
                            continue;
                        }

                        let result = generate_chunk(&task);
                        let _ = tx.send(result);
                        flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .expect("Failed to spawn chunk generation worker thread");
            handles.push(handle);
        }

        info!(workers = worker_count, "Chunk generation pipeline started");

        Self {
            task_sender: Some(task_tx),
            result_receiver: result_rx,
            worker_handles: handles,
            latest_tokens,
            in_flight,
        }
    }

    /// Queue a task. Its token becomes the latest for its chunk. Returns
    /// `false` once the pipeline has been shut down.
    pub fn submit(&self, task: GenerationTask) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };
        self.latest_tokens.insert(task.coord, task.token);
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(task).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Forget a chunk: queued tasks for it are skipped by the workers.
    pub fn forget(&self, coord: ChunkCoord) {
        self.latest_tokens.remove(&coord);
    }

    /// Drain all completed results. Called once per tick on the main thread.
    pub fn drain_results(&self) -> Vec<GenerationResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            results.push(result);
        }
        results
    }

    /// Number of tasks queued or executing.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    /// Shut down all worker threads gracefully.
    ///
    /// Drops the task sender to signal workers to exit, then joins all threads.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for GenerationPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
