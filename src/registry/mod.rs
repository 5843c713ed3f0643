//! Peer record store
//!
//! One [`PeerRegistry`] instance holds everything the process knows about
//! the peers currently visible on the local network: announced roles,
//! fetched metadata and the live RPC bindings used to talk to them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::cloud::{ContentProvider, ContentService, ServiceUrlResolver};
use crate::display::{MeshSnapshot, PeerSummary};
use crate::rpc::{ContentBinding, PlayerBinding};
use crate::types::{Capability, CapabilitySet, DeviceIdentity, PeerId, PlayerConfig, ServiceInfo};

#[cfg(test)]
mod tests;

/// Everything known about one visible peer
///
/// Records are value snapshots; bindings are shared through `Arc` so a
/// clone stays usable after the registry moves on.
#[derive(Debug, Clone, Default)]
pub struct PeerRecord {
    /// Display name announced by the peer, if any
    pub name: Option<String>,

    /// Roles the peer announced
    pub capabilities: CapabilitySet,

    /// RPC binding for the peer's SERVICE role
    pub service_binding: Option<Arc<ContentBinding>>,

    /// RPC binding for the peer's PLAYER role
    pub player_binding: Option<Arc<PlayerBinding>>,

    /// Metadata fetched from the peer's content service
    pub service_info: Option<ServiceInfo>,

    /// Configuration fetched from the peer's player
    pub player_config: Option<PlayerConfig>,

    /// Matching cloud device record, when the peer is registered
    pub cloud_identity: Option<DeviceIdentity>,
}

impl PeerRecord {
    /// Best available display name
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a PeerId) -> &'a str {
        self.name.as_deref().unwrap_or(id.as_str())
    }
}

/// Thread-safe store of peer records keyed by peer id
///
/// All access goes through one coarse lock; operations are short and
/// never perform IO while holding it.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    inner: Mutex<HashMap<PeerId, PeerRecord>>,
}

impl PeerRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the announcement-derived fields of a peer
    ///
    /// Connect and update announcements both land here. Metadata and
    /// bindings for roles the peer still announces are kept; anything
    /// tied to a role the peer dropped is discarded.
    pub fn upsert(&self, id: PeerId, name: Option<String>, capabilities: CapabilitySet) {
        let mut inner = self.inner.lock().unwrap();
        let record = inner.entry(id.clone()).or_default();
        record.name = name;
        record.capabilities = capabilities;
        if !capabilities.contains(Capability::Service) {
            record.service_binding = None;
            record.service_info = None;
        }
        if !capabilities.contains(Capability::Player) {
            record.player_binding = None;
            record.player_config = None;
        }
        debug!(peer = %id, %capabilities, "peer record upserted");
    }

    /// Remove a peer record, dropping its bindings
    ///
    /// Removing an unknown peer is a no-op.
    pub fn remove(&self, id: &PeerId) -> Option<PeerRecord> {
        let removed = self.inner.lock().unwrap().remove(id);
        if removed.is_some() {
            debug!(peer = %id, "peer record removed");
        }
        removed
    }

    /// Snapshot of one peer record
    #[must_use]
    pub fn get(&self, id: &PeerId) -> Option<PeerRecord> {
        self.inner.lock().unwrap().get(id).cloned()
    }

    /// Whether the peer is currently known
    #[must_use]
    pub fn contains(&self, id: &PeerId) -> bool {
        self.inner.lock().unwrap().contains_key(id)
    }

    /// Number of known peers
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Whether no peers are known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Snapshot of all peer records
    #[must_use]
    pub fn list(&self) -> Vec<(PeerId, PeerRecord)> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect()
    }

    /// Peers announcing the PLAYER role, sorted by display name
    #[must_use]
    pub fn players(&self) -> Vec<(PeerId, PeerRecord)> {
        self.sorted_by_role(Capability::Player)
    }

    /// Peers announcing the SERVICE role, sorted by display name
    #[must_use]
    pub fn services(&self) -> Vec<(PeerId, PeerRecord)> {
        self.sorted_by_role(Capability::Service)
    }

    fn sorted_by_role(&self, role: Capability) -> Vec<(PeerId, PeerRecord)> {
        let mut peers: Vec<(PeerId, PeerRecord)> = self
            .inner
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, record)| record.capabilities.contains(role))
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        peers.sort_by(|(a_id, a), (b_id, b)| {
            a.display_name(a_id).cmp(b.display_name(b_id))
        });
        peers
    }

    /// Attach a content binding to a known peer
    ///
    /// Returns `false` when the peer disconnected in the meantime.
    pub fn attach_service_binding(&self, id: &PeerId, binding: Arc<ContentBinding>) -> bool {
        self.with_record(id, |record| record.service_binding = Some(binding))
    }

    /// Attach a player binding to a known peer
    ///
    /// Returns `false` when the peer disconnected in the meantime.
    pub fn attach_player_binding(&self, id: &PeerId, binding: Arc<PlayerBinding>) -> bool {
        self.with_record(id, |record| record.player_binding = Some(binding))
    }

    /// Store fetched service metadata for a known peer
    pub fn set_service_info(&self, id: &PeerId, info: ServiceInfo) -> bool {
        self.with_record(id, |record| record.service_info = Some(info))
    }

    /// Store a fetched player configuration for a known peer
    pub fn set_player_config(&self, id: &PeerId, config: PlayerConfig) -> bool {
        self.with_record(id, |record| record.player_config = Some(config))
    }

    /// Mark a peer as matching a cloud device record
    pub fn set_cloud_identity(&self, id: &PeerId, identity: DeviceIdentity) -> bool {
        self.with_record(id, |record| record.cloud_identity = Some(identity))
    }

    fn with_record(&self, id: &PeerId, apply: impl FnOnce(&mut PeerRecord)) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.get_mut(id) {
            Some(record) => {
                apply(record);
                true
            }
            None => false,
        }
    }

    /// The live bindings of one peer: player first, then service
    #[must_use]
    pub fn bindings_for(
        &self,
        id: &PeerId,
    ) -> (Option<Arc<PlayerBinding>>, Option<Arc<ContentBinding>>) {
        let inner = self.inner.lock().unwrap();
        match inner.get(id) {
            Some(record) => (record.player_binding.clone(), record.service_binding.clone()),
            None => (None, None),
        }
    }

    /// All live content bindings
    #[must_use]
    pub fn content_bindings(&self) -> Vec<Arc<ContentBinding>> {
        self.inner
            .lock()
            .unwrap()
            .values()
            .filter_map(|record| record.service_binding.clone())
            .collect()
    }

    /// Build a display snapshot of the current mesh state
    #[must_use]
    pub fn snapshot(&self) -> MeshSnapshot {
        let peers = self
            .inner
            .lock()
            .unwrap()
            .iter()
            .map(|(id, record)| PeerSummary {
                id: id.clone(),
                name: record.name.clone(),
                capabilities: record.capabilities,
                has_service_info: record.service_info.is_some(),
                has_player_config: record.player_config.is_some(),
                registered: record.cloud_identity.is_some(),
            })
            .collect();
        MeshSnapshot { peers }
    }
}

impl ContentProvider for PeerRegistry {
    /// Look up a peer's content service by the service identity it
    /// reported in its metadata
    fn content_service(&self, service_id: &str) -> Option<Arc<dyn ContentService>> {
        let inner = self.inner.lock().unwrap();
        for (id, record) in inner.iter() {
            let matches = record
                .service_info
                .as_ref()
                .is_some_and(|info| info.id == service_id)
                || id.as_str() == service_id;
            if matches {
                if let Some(binding) = record.service_binding.clone() {
                    return Some(binding);
                }
            }
        }
        None
    }
}

impl ServiceUrlResolver for PeerRegistry {
    fn service_url(&self, service_id: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner.iter().find_map(|(id, record)| {
            let info = record.service_info.as_ref()?;
            if info.id == service_id || id.as_str() == service_id {
                info.service_url.clone()
            } else {
                None
            }
        })
    }
}
