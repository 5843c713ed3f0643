//! Player role façade

use std::sync::Arc;

use tracing::{info, warn};

use crate::cloud::{CloudService, RegisterDeviceRequest, ScrobbleSink};
use crate::discovery::DiscoveryHandler;
use crate::engine::{NotificationEmitter, PlaybackEngine, PlayerCommandService};
use crate::error::Result;
use crate::registry::PeerRegistry;
use crate::router::{InboundMessage, MessageRouter};
use crate::settings::{SettingsStore, keys};
use crate::transport::{DiscoveryEvent, MessageTransport};
use crate::types::{MeshConfig, PlayerStatus};

/// Executes transport commands and simulates playback
///
/// Wires the playback engine, its command dispatcher, the router and the
/// registry together. The registry doubles as the engine's content
/// provider: discovered SERVICE peers resolve `service:`-prefixed item
/// ids and deferred streaming references.
pub struct PlayerNode {
    config: MeshConfig,
    cloud: Arc<dyn CloudService>,
    settings: Arc<dyn SettingsStore>,
    registry: Arc<PeerRegistry>,
    discovery: Arc<DiscoveryHandler>,
    engine: Arc<PlaybackEngine>,
    router: MessageRouter,
}

impl PlayerNode {
    /// Create a player over the given collaborators
    #[must_use]
    pub fn new(
        config: MeshConfig,
        cloud: Arc<dyn CloudService>,
        transport: Arc<dyn MessageTransport>,
        settings: Arc<dyn SettingsStore>,
        scrobble: Option<Arc<dyn ScrobbleSink>>,
    ) -> Self {
        let registry = Arc::new(PeerRegistry::new());
        let discovery = Arc::new(DiscoveryHandler::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
            config.request_timeout,
        ));

        let notifier = NotificationEmitter::new(Arc::clone(&transport))
            .with_settings(Arc::clone(&settings));
        let mut engine = PlaybackEngine::new(notifier, config.tick_interval)
            .with_content_provider(Arc::clone(&registry) as _)
            .with_service_urls(Arc::clone(&registry) as _);
        if let Some(scrobble) = scrobble {
            engine = engine.with_scrobble(scrobble);
        }
        let engine = Arc::new(engine);

        let commands = Arc::new(PlayerCommandService::new(
            Arc::clone(&engine),
            Arc::clone(&settings),
        ));
        let router = MessageRouter::new(Arc::clone(&registry), transport)
            .with_command_service(commands);

        Self {
            config,
            cloud,
            settings,
            registry,
            discovery,
            engine,
            router,
        }
    }

    /// Run the cloud startup workflow
    ///
    /// Registers the device when no access token is stored; refreshes the
    /// device's network address when one is. An unauthorized token is
    /// cleared and the player continues unregistered; other cloud errors
    /// are logged and ignored the same way. Never fails.
    ///
    /// # Errors
    ///
    /// Reserved; the current workflow always returns `Ok`.
    pub async fn start(&self) -> Result<()> {
        if self.settings.get(keys::PLAYER_NAME).is_none() {
            self.settings.set(keys::PLAYER_NAME, &self.config.device_name);
        }
        if self.settings.get(keys::PLAYER_MODEL).is_none() {
            self.settings.set(keys::PLAYER_MODEL, &self.config.device_model);
        }

        if self.settings.has_access_token() {
            if let Some(address) = self.config.local_address {
                match self.cloud.set_device_address(address).await {
                    Ok(identity) => info!(device = %identity.id, "device address refreshed"),
                    Err(e) if e.is_unauthorized() => {
                        warn!("access token rejected, continuing unregistered");
                        self.settings.clear_access_token();
                    }
                    Err(e) => warn!(error = %e, "device address refresh failed"),
                }
            }
            return Ok(());
        }

        let request = RegisterDeviceRequest {
            model: self.config.device_model.clone(),
            name: self.config.device_name.clone(),
            address: self.config.local_address,
            api_key: self.config.api_key.clone(),
            hardware_id: None,
        };
        match self.cloud.register_device(request).await {
            Ok(identity) => {
                if let Some(token) = identity.access_token {
                    self.settings.set(keys::ACCESS_TOKEN, &token);
                }
                info!(device = %identity.id, "player registered in the cloud");
            }
            Err(e) => warn!(error = %e, "cloud registration failed, continuing unregistered"),
        }
        Ok(())
    }

    /// Feed a discovery event from the embedding transport
    pub fn on_discovery_event(&self, event: DiscoveryEvent) {
        self.discovery.handle_event(event);
    }

    /// Feed an inbound transport message
    pub async fn on_message(&self, message: InboundMessage) {
        self.router.route(message).await;
    }

    /// The playback engine driving this player
    #[must_use]
    pub fn engine(&self) -> &Arc<PlaybackEngine> {
        &self.engine
    }

    /// Snapshot of the current playback status
    #[must_use]
    pub fn status(&self) -> PlayerStatus {
        self.engine.status()
    }

    /// The peer registry backing this player
    #[must_use]
    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    /// Stop the progress ticker ahead of teardown
    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

impl std::fmt::Debug for PlayerNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerNode")
            .field("peers", &self.registry.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::settings::MemorySettings;
    use crate::testing::{MockCloud, MockTransport};

    fn player_with(cloud: Arc<MockCloud>, settings: Arc<MemorySettings>, config: MeshConfig) -> PlayerNode {
        PlayerNode::new(
            config,
            cloud,
            Arc::new(MockTransport::new()),
            settings,
            None,
        )
    }

    #[tokio::test]
    async fn test_start_registers_and_seeds_settings() {
        let cloud = Arc::new(MockCloud::new());
        let settings = Arc::new(MemorySettings::new());
        let config = MeshConfig::builder().device_name("Kitchen").build();
        let player = player_with(Arc::clone(&cloud), Arc::clone(&settings), config);

        player.start().await.unwrap();
        assert_eq!(settings.access_token().as_deref(), Some("token-1"));
        assert_eq!(settings.get(keys::PLAYER_NAME).as_deref(), Some("Kitchen"));
        assert_eq!(cloud.register_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_start_refreshes_address_with_stored_token() {
        let cloud = Arc::new(MockCloud::new());
        let settings = Arc::new(MemorySettings::new());
        settings.set(keys::ACCESS_TOKEN, "existing");
        let address = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        let config = MeshConfig::builder().local_address(address).build();
        let player = player_with(Arc::clone(&cloud), settings, config);

        player.start().await.unwrap();
        assert_eq!(cloud.address_updates(), vec![address]);
        assert!(cloud.register_requests().is_empty());
    }

    #[tokio::test]
    async fn test_unauthorized_start_continues_unregistered() {
        let cloud = Arc::new(MockCloud::new());
        cloud.set_unauthorized(true);
        let settings = Arc::new(MemorySettings::new());
        settings.set(keys::ACCESS_TOKEN, "stale");
        let config = MeshConfig::builder()
            .local_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
            .build();
        let player = player_with(cloud, Arc::clone(&settings), config);

        // Startup must not fail even though the cloud rejected the token
        player.start().await.unwrap();
        assert!(!settings.has_access_token());
        assert!(!player.status().playing);
    }
}
