//! Level-of-detail management: distance-band LOD selection, grid resolution
//! per level, and nearest-first work queues.

mod priority_queue;
mod selector;

pub use priority_queue::ProximityQueue;
pub use selector::{LodBands, LodGridSizes, LodLevel};
