//! Core types module

/// Cloud account and device records
pub mod cloud;
/// Library configuration
pub mod config;
/// Peer identity and capability roles
pub mod peer;
/// The playback queue
pub mod queue;
/// Player status and queue modes
pub mod state;
/// Queue items and streaming references
pub mod track;


pub use cloud::{DeviceIdentity, PlayerConfig, ServiceInfo, UserInfo};
pub use config::MeshConfig;
pub use peer::{Capability, CapabilitySet, PeerId};
pub use queue::PlaybackQueue;
pub use state::{CloudCoreStatus, PlayerStatus, QueueMode};
pub use track::{QueueItem, StreamingRef, TrackAttributes};
