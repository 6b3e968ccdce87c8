//! Outbound notifications from the chunk streamer.
//!
//! The streamer never talks to a renderer or physics engine directly. Every
//! handoff is queued as a [`StreamEvent`] and drained by the collaborator
//! with [`ChunkStreamer::drain_events`](crate::ChunkStreamer::drain_events).

use std::sync::Arc;

use loam_coords::ChunkCoord;
use loam_lod::LodLevel;
use loam_mesh::MeshData;
use loam_terrain::HeightGrid;

/// A chunk lifecycle notification.
#[derive(Clone, Debug)]
pub enum StreamEvent {
    /// A new mesh replaced whatever the chunk displayed before.
    MeshReady {
        coord: ChunkCoord,
        lod: LodLevel,
        token: u64,
        mesh: Arc<MeshData>,
    },
    /// A High chunk's deferred collider step fired with its token intact.
    ColliderReady {
        coord: ChunkCoord,
        token: u64,
        heights: Arc<HeightGrid>,
        mesh: Arc<MeshData>,
    },
    /// The chunk's tree list changed; `count` is the new number of placements.
    TreesChanged { coord: ChunkCoord, count: usize },
    /// The chunk left render distance and all of its data was released.
    ChunkRemoved { coord: ChunkCoord },
}

impl StreamEvent {
    /// The chunk this event refers to.
    pub fn coord(&self) -> ChunkCoord {
        match self {
            StreamEvent::MeshReady { coord, .. }
            | StreamEvent::ColliderReady { coord, .. }
            | StreamEvent::TreesChanged { coord, .. }
            | StreamEvent::ChunkRemoved { coord } => *coord,
        }
    }
}

/// Counters describing one call to [`ChunkStreamer::tick`](crate::ChunkStreamer::tick).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    pub viewer_chunk: ChunkCoord,
    /// Whether the viewer crossed into a new chunk this tick.
    pub viewer_moved: bool,
    /// Chunks torn down for leaving render distance.
    pub removed: u32,
    /// Creation tasks submitted.
    pub created: u32,
    /// LOD change and refresh tasks submitted.
    pub lod_updates: u32,
    /// Results assigned to chunks.
    pub meshes_applied: u32,
    /// Results discarded for a dead chunk or an advanced token.
    pub stale_dropped: u32,
    pub colliders_ready: u32,
    pub colliders_cancelled: u32,
    /// Valid results left waiting for a later tick's apply budget.
    pub pending_results: u32,
    /// Chunks currently tracked in any state.
    pub tracked_chunks: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_coord() {
        let c = ChunkCoord::new(3, -4);
        assert_eq!(StreamEvent::ChunkRemoved { coord: c }.coord(), c);
        assert_eq!(StreamEvent::TreesChanged { coord: c, count: 2 }.coord(), c);
    }
}
