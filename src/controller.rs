//! Controller role façade

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::cloud::{CloudService, RegisterDeviceRequest};
use crate::discovery::DiscoveryHandler;
use crate::display::DisplaySink;
use crate::error::{MeshError, Result};
use crate::registry::{PeerRecord, PeerRegistry};
use crate::router::{InboundMessage, MessageRouter};
use crate::settings::{SettingsStore, keys};
use crate::transport::{DiscoveryEvent, MessageTransport};
use crate::types::{MeshConfig, PeerId};

/// Observes the mesh and issues commands to player peers
///
/// Wires the registry, discovery handler and router together, and runs
/// the cloud startup workflow: register the device when no access token
/// is stored, resolve the account user, and load the registered-device
/// map used to tag discovered players.
pub struct Controller {
    config: MeshConfig,
    cloud: Arc<dyn CloudService>,
    settings: Arc<dyn SettingsStore>,
    registry: Arc<PeerRegistry>,
    discovery: Arc<DiscoveryHandler>,
    router: MessageRouter,
}

impl Controller {
    /// Create a controller over the given collaborators
    #[must_use]
    pub fn new(
        config: MeshConfig,
        cloud: Arc<dyn CloudService>,
        transport: Arc<dyn MessageTransport>,
        settings: Arc<dyn SettingsStore>,
        display: Arc<dyn DisplaySink>,
    ) -> Self {
        let registry = Arc::new(PeerRegistry::new());
        let discovery = Arc::new(
            DiscoveryHandler::new(
                Arc::clone(&registry),
                Arc::clone(&transport),
                config.request_timeout,
            )
            .with_display(display),
        );
        let router = MessageRouter::new(Arc::clone(&registry), transport);
        Self {
            config,
            cloud,
            settings,
            registry,
            discovery,
            router,
        }
    }

    /// Run the cloud startup workflow
    ///
    /// # Errors
    ///
    /// [`MeshError::Unauthorized`] halts the controller after clearing
    /// the stored token; other cloud errors propagate unchanged.
    pub async fn start(&self) -> Result<()> {
        if !self.settings.has_access_token() {
            let identity = self
                .cloud
                .register_device(RegisterDeviceRequest {
                    model: self.config.device_model.clone(),
                    name: self.config.device_name.clone(),
                    address: self.config.local_address,
                    api_key: self.config.api_key.clone(),
                    hardware_id: None,
                })
                .await?;
            if let Some(token) = identity.access_token {
                self.settings.set(keys::ACCESS_TOKEN, &token);
            }
            info!(device = %identity.id, "controller registered in the cloud");
        }

        let user = match self.cloud.get_current_user().await {
            Ok(user) => user,
            Err(e) if e.is_unauthorized() => {
                warn!("access token rejected, clearing credentials");
                self.settings.clear_access_token();
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        self.settings.set(keys::USER_ID, &user.id);
        info!(user = %user.name, "cloud account resolved");

        let devices = self.cloud.find_devices().await?;
        self.discovery.set_known_devices(devices);
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

    /// Send a command request to a discovered player peer
    ///
    /// # Errors
    ///
    /// [`MeshError::Unroutable`] when the peer has no player binding,
    /// otherwise the request's own error kinds.
    pub async fn send_player_command(
        &self,
        peer: &PeerId,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value> {
        let (player, _) = self.registry.bindings_for(peer);
        let Some(binding) = player else {
            return Err(MeshError::Unroutable {
                sender: peer.to_string(),
            });
        };
        binding.send_command(method, params).await
    }

    /// Discovered player peers, sorted by display name
    #[must_use]
    pub fn players(&self) -> Vec<(PeerId, PeerRecord)> {
        self.registry.players()
    }

    /// Discovered service peers, sorted by display name
    #[must_use]
    pub fn services(&self) -> Vec<(PeerId, PeerRecord)> {
        self.registry.services()
    }

    /// The peer registry backing this controller
    #[must_use]
    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("peers", &self.registry.len())
            .finish_non_exhaustive()
    }
}
