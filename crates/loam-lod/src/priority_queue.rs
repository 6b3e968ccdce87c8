//! Nearest-first queue of chunk work items.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use loam_coords::ChunkCoord;

#[derive(Clone, Debug)]
struct QueueEntry {
    coord: ChunkCoord,
    /// Squared grid distance to the viewer; smaller is more urgent.
    distance_sq: u64,
    /// Generation counter to skip entries superseded by a later push.
    generation: u64,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Ties resolve by coordinate so pop order is deterministic.
        self.distance_sq
            .cmp(&other.distance_sq)
            .then_with(|| self.coord.cmp(&other.coord))
    }
}

/// Min-heap of chunk coordinates keyed by distance to the viewer.
///
/// Each coordinate appears at most once: pushing a queued coordinate
/// replaces its priority, and [`remove`](Self::remove) or
/// [`retain`](Self::retain) drop it. Superseded heap entries are skipped
/// lazily on pop.
#[derive(Debug, Default)]
pub struct ProximityQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    /// Maps queued coordinates to their current generation.
    generations: HashMap<ChunkCoord, u64>,
    next_generation: u64,
}

impl ProximityQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `coord`, or update its priority if already queued.
    pub fn push(&mut self, coord: ChunkCoord, viewer_chunk: ChunkCoord) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.generations.insert(coord, generation);
        self.heap.push(Reverse(QueueEntry {
            coord,
            distance_sq: coord.distance_sq(viewer_chunk),
            generation,
        }));
    }

    /// Remove and return the coordinate nearest to the viewer.
    pub fn pop(&mut self) -> Option<ChunkCoord> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            if let Some(&current) = self.generations.get(&entry.coord)
                && current == entry.generation
            {
                self.generations.remove(&entry.coord);
                return Some(entry.coord);
            }
            // Stale entry, skip it.
        }
        None
    }

    /// Drop `coord` from the queue. Returns whether it was queued.
    pub fn remove(&mut self, coord: ChunkCoord) -> bool {
        self.generations.remove(&coord).is_some()
    }

    /// Keep only the coordinates for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(ChunkCoord) -> bool) {
        self.generations.retain(|&coord, _| keep(coord));
        if self.generations.is_empty() {
            self.heap.clear();
        }
    }

    /// Recompute every priority against a new viewer chunk.
    pub fn reprioritize(&mut self, viewer_chunk: ChunkCoord) {
        let mut queued: Vec<ChunkCoord> = self.generations.keys().copied().collect();
        queued.sort();
        self.heap.clear();
        self.generations.clear();
        for coord in queued {
            self.push(coord, viewer_chunk);
        }
    }

    #[must_use]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.generations.contains_key(&coord)
    }

    /// Number of valid entries in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.generations.clear();
    }
}
