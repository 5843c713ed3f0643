use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a discovered peer, stable across updates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Create a peer identity from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PeerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A single role a peer can announce on the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Capability {
    /// Executes transport commands and renders audio
    Player,
    /// Offers content access (browse, streaming references)
    Service,
    /// Observes peers and issues commands
    Controller,
}

/// The set of roles a peer announces, possibly combined
///
/// A peer that is both a player and a service is one record with two
/// flags, never two records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    /// Peer offers a player role
    pub player: bool,

    /// Peer offers a content-access service
    pub service: bool,

    /// Peer acts as a controller
    pub controller: bool,
}

impl CapabilitySet {
    /// Check whether the set contains the given capability
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::Player => self.player,
            Capability::Service => self.service,
            Capability::Controller => self.controller,
        }
    }

    /// Builder method enabling the player role
    #[must_use]
    pub fn with_player(mut self) -> Self {
        self.player = true;
        self
    }

    /// Builder method enabling the service role
    #[must_use]
    pub fn with_service(mut self) -> Self {
        self.service = true;
        self
    }

    /// Builder method enabling the controller role
    #[must_use]
    pub fn with_controller(mut self) -> Self {
        self.controller = true;
        self
    }

    /// Check whether no role is announced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.player || self.service || self.controller)
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.player {
            parts.push("PLAYER");
        }
        if self.service {
            parts.push("SERVICE");
        }
        if self.controller {
            parts.push("CONTROLLER");
        }
        f.write_str(&parts.join("+"))
    }
}
