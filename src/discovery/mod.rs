//! Discovery event handling
//!
//! Edge-triggered: the embedding transport reports peer visibility
//! changes and the handler updates the registry, spins up RPC bindings
//! and kicks off metadata fetches. Fetches run on their own tasks; the
//! event path itself never blocks on the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cloud::ContentService;
use crate::display::DisplaySink;
use crate::registry::PeerRegistry;
use crate::rpc::{ContentBinding, PlayerBinding};
use crate::transport::{DiscoveryEvent, MessageTransport};
use crate::types::{Capability, CapabilitySet, DeviceIdentity, PeerId};

#[cfg(test)]
mod tests;

/// Turns discovery events into registry updates and metadata fetches
pub struct DiscoveryHandler {
    registry: Arc<PeerRegistry>,
    transport: Arc<dyn MessageTransport>,
    display: Option<Arc<dyn DisplaySink>>,
    known_devices: Mutex<HashMap<PeerId, DeviceIdentity>>,
    request_timeout: Duration,
}

impl DiscoveryHandler {
    /// Create a handler feeding the given registry
    #[must_use]
    pub fn new(
        registry: Arc<PeerRegistry>,
        transport: Arc<dyn MessageTransport>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            display: None,
            known_devices: Mutex::new(HashMap::new()),
            request_timeout,
        }
    }

    /// Attach a display refreshed after every event and metadata fetch
    #[must_use]
    pub fn with_display(mut self, display: Arc<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    /// Replace the cloud-registered device map used for identity tagging
    pub fn set_known_devices(&self, devices: Vec<DeviceIdentity>) {
        let mut known = self.known_devices.lock().unwrap();
        known.clear();
        for device in devices {
            known.insert(PeerId::from(device.id.clone()), device);
        }
    }

    /// Handle one discovery event
    ///
    /// Connected and updated announcements take the same path: the
    /// upstream transport may report updates for peers it never announced
    /// as connected, so both perform an idempotent upsert.
    pub fn handle_event(self: &Arc<Self>, event: DiscoveryEvent) {
        match event {
            DiscoveryEvent::Connected {
                id,
                name,
                capabilities,
            }
            | DiscoveryEvent::Updated {
                id,
                name,
                capabilities,
            } => self.on_peer_seen(id, name, capabilities),
            DiscoveryEvent::Disconnected { id } => {
                info!(peer = %id, "peer disconnected");
                self.registry.remove(&id);
            }
        }
        self.refresh_display();
    }

    fn on_peer_seen(self: &Arc<Self>, id: PeerId, name: Option<String>, capabilities: CapabilitySet) {
        info!(peer = %id, %capabilities, "peer visible");
        self.registry.upsert(id.clone(), name, capabilities);

        if capabilities.contains(Capability::Service) {
            let binding = Arc::new(ContentBinding::new(
                id.clone(),
                Arc::clone(&self.transport),
                self.request_timeout,
            ));
            if self.registry.attach_service_binding(&id, Arc::clone(&binding)) {
                self.spawn_service_fetch(id.clone(), binding);
            }
        }

        if capabilities.contains(Capability::Player) {
            if let Some(identity) = self.known_devices.lock().unwrap().get(&id).cloned() {
                debug!(peer = %id, "peer matches cloud-registered device");
                self.registry.set_cloud_identity(&id, identity);
            }
            let binding = Arc::new(PlayerBinding::new(
                id.clone(),
                Arc::clone(&self.transport),
                self.request_timeout,
            ));
            if self.registry.attach_player_binding(&id, Arc::clone(&binding)) {
                self.spawn_player_fetch(id, binding);
            }
        }
    }

    /// Fetch service metadata off the event path. No retry: a failed or
    /// timed-out fetch just leaves the metadata absent.
    fn spawn_service_fetch(self: &Arc<Self>, id: PeerId, binding: Arc<ContentBinding>) {
        let handler = Arc::clone(self);
        tokio::spawn(async move {
            match binding.get_service_information().await {
                Ok(info) => {
                    if handler.registry.set_service_info(&id, info) {
                        handler.refresh_display();
                    }
                }
                Err(e) => warn!(peer = %id, error = %e, "service metadata fetch failed"),
            }
        });
    }

    fn spawn_player_fetch(self: &Arc<Self>, id: PeerId, binding: Arc<PlayerBinding>) {
        let handler = Arc::clone(self);
        tokio::spawn(async move {
            match binding.get_player_configuration().await {
                Ok(config) => {
                    if handler.registry.set_player_config(&id, config) {
                        handler.refresh_display();
                    }
                }
                Err(e) => warn!(peer = %id, error = %e, "player configuration fetch failed"),
            }
        });
    }

    fn refresh_display(&self) {
        if let Some(display) = &self.display {
            display.refresh(self.registry.snapshot());
        }
    }
}

impl std::fmt::Debug for DiscoveryHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryHandler")
            .field("known_devices", &self.known_devices.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}
