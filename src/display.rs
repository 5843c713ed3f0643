//! Display/UI collaborator seam

use crate::types::{CapabilitySet, PeerId};

/// Snapshot of mesh state handed to the display collaborator
///
/// Peers are unsorted; display code sorts by name for presentation.
#[derive(Debug, Clone, Default)]
pub struct MeshSnapshot {
    /// One entry per known peer
    pub peers: Vec<PeerSummary>,
}

/// Display-relevant summary of a peer record
#[derive(Debug, Clone)]
pub struct PeerSummary {
    /// Identity of the peer
    pub id: PeerId,

    /// Display name, if known
    pub name: Option<String>,

    /// Announced roles
    pub capabilities: CapabilitySet,

    /// Whether service metadata has been fetched
    pub has_service_info: bool,

    /// Whether a player configuration has been fetched
    pub has_player_config: bool,

    /// Whether the peer matches a cloud-registered device
    pub registered: bool,
}

/// Consumer of mesh state snapshots
///
/// `refresh` is fire-and-forget and must never block the calling thread;
/// implementations that render slowly should hand the snapshot off to
/// their own task.
pub trait DisplaySink: Send + Sync {
    /// Present a fresh snapshot
    fn refresh(&self, snapshot: MeshSnapshot);
}
