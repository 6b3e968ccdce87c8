//! Chunk streaming around a moving viewer: lifecycle state machine, LOD
//! scheduling with per-tick budgets, stale result rejection, deferred
//! collider finalization, tree bookkeeping and the terrain query surface.

mod events;
mod settings;
mod streamer;

pub use events::{StreamEvent, TickReport};
pub use settings::{RegionSettings, StreamerSettings, WorldSettings};
pub use streamer::{ChunkStreamer, ChunkState, ColliderState};
