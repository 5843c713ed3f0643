//! Message transport seam and discovery event types
//!
//! The peer-discovery wire protocol is an external service boundary. The
//! embedding application owns the actual transport and feeds the core
//! through these types.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::{Capability, CapabilitySet, PeerId};

/// Outbound message transport
///
/// Implementations deliver opaque payloads to a peer (or broadcast to
/// every peer announcing the target capability when `target` is `None`).
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Send a payload to the addressed peer and capability
    ///
    /// # Errors
    ///
    /// Returns [`crate::MeshError::Transport`] if delivery fails.
    async fn send(
        &self,
        target: Option<&PeerId>,
        target_capability: Capability,
        payload: Bytes,
    ) -> Result<()>;
}

/// A peer visibility change reported by the discovery transport
///
/// `Updated` must be handled identically to `Connected`: the upstream
/// transport may emit update notifications for peers it never announced
/// as connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// A peer appeared on the network
    Connected {
        /// Identity of the peer
        id: PeerId,
        /// Display name, if the peer has one
        name: Option<String>,
        /// Roles the peer announces
        capabilities: CapabilitySet,
    },
    /// A known (or unknown, see above) peer changed its announcement
    Updated {
        /// Identity of the peer
        id: PeerId,
        /// Display name, if the peer has one
        name: Option<String>,
        /// Roles the peer announces
        capabilities: CapabilitySet,
    },
    /// A peer left the network
    Disconnected {
        /// Identity of the peer
        id: PeerId,
    },
}
