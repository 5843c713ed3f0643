//! # audiomesh
//!
//! A pure Rust library for coordinating networked audio players and content
//! services over a peer-to-peer JSON-RPC mesh.
//!
//! ## Features
//!
//! - Peer/service registry fed by local-network discovery events
//! - JSON-RPC message routing between controllers, players and services
//! - A simulated playback engine with queue, repeat and shuffle modes
//! - Cloud registration and scrobble reporting behind narrow trait seams
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use audiomesh::testing::{MockCloud, MockDisplay, MockTransport};
//! use audiomesh::{CapabilitySet, Controller, DiscoveryEvent, MemorySettings, MeshConfig};
//!
//! # async fn example() -> Result<(), audiomesh::MeshError> {
//! let controller = Controller::new(
//!     MeshConfig::default(),
//!     Arc::new(MockCloud::new()),
//!     Arc::new(MockTransport::new()),
//!     Arc::new(MemorySettings::new()),
//!     Arc::new(MockDisplay::new()),
//! );
//!
//! // Feed discovery events from the embedding transport
//! controller.on_discovery_event(DiscoveryEvent::Connected {
//!     id: "player-1".into(),
//!     name: Some("Kitchen".to_string()),
//!     capabilities: CapabilitySet::default().with_player(),
//! });
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **High-level**: [`Controller`] and [`PlayerNode`] - role façades
//! - **Mid-level**: registry, router, discovery handler, playback engine
//! - **Low-level**: JSON-RPC envelope and per-peer bindings

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

/// Testing utilities
pub mod testing;

// Internal modules
pub mod cloud;
mod controller;
pub mod discovery;
pub mod display;
pub mod engine;
mod player;
pub mod registry;
pub mod router;
pub mod rpc;
pub mod settings;
pub mod transport;

// Re-exports
pub use cloud::{CloudService, ContentProvider, ContentService, ScrobbleSink};
pub use controller::Controller;
pub use discovery::DiscoveryHandler;
pub use display::{DisplaySink, MeshSnapshot};
pub use engine::{PlaybackEngine, PlayerCommandService};
pub use error::MeshError;
pub use player::PlayerNode;
pub use registry::{PeerRecord, PeerRegistry};
pub use router::{InboundMessage, MessageRouter};
pub use settings::{MemorySettings, SettingsStore};
pub use transport::{DiscoveryEvent, MessageTransport};
pub use types::{
    Capability, CapabilitySet, MeshConfig, PeerId, PlaybackQueue, PlayerStatus, QueueItem,
    QueueMode, StreamingRef,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        Capability, CapabilitySet, Controller, DiscoveryEvent, MeshConfig, MeshError,
        MessageRouter, MessageTransport, PeerId, PeerRegistry, PlaybackEngine, PlaybackQueue,
        PlayerNode, PlayerStatus, QueueItem, QueueMode, StreamingRef,
    };
}
