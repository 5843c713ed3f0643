use std::sync::Arc;

use serde_json::{Value, json};
use tracing::warn;

use crate::error::Result;
use crate::rpc::RpcEnvelope;
use crate::settings::SettingsStore;
use crate::transport::MessageTransport;
use crate::types::{Capability, CloudCoreStatus, PlaybackQueue, PlayerStatus};

/// Broadcasts playback state changes to controller listeners
///
/// Notifications are fire-and-forget JSON-RPC messages addressed to every
/// peer listening in the CONTROLLER role.
pub struct NotificationEmitter {
    transport: Arc<dyn MessageTransport>,
    settings: Option<Arc<dyn SettingsStore>>,
}

impl NotificationEmitter {
    /// Create an emitter broadcasting over the given transport
    #[must_use]
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            transport,
            settings: None,
        }
    }

    /// Attach a settings store so notifications carry the cloud
    /// registration status and user identity
    #[must_use]
    pub fn with_settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    fn cloud_status(&self) -> (CloudCoreStatus, Option<String>) {
        match &self.settings {
            Some(settings) if settings.has_access_token() => (
                CloudCoreStatus::Registered,
                settings.get(crate::settings::keys::USER_ID),
            ),
            _ => (CloudCoreStatus::Unregistered, None),
        }
    }

    /// Broadcast a `playerStatusChanged` notification
    ///
    /// # Errors
    ///
    /// Returns [`crate::MeshError::Transport`] if the broadcast fails.
    pub async fn player_status_changed(&self, status: &PlayerStatus) -> Result<()> {
        let (cloud, user_id) = self.cloud_status();
        let params = status_params(status, cloud, user_id);
        self.broadcast("playerStatusChanged", params).await
    }

    /// Broadcast a `playbackQueueChanged` notification
    ///
    /// # Errors
    ///
    /// Returns [`crate::MeshError::Transport`] if the broadcast fails.
    pub async fn playback_queue_changed(&self, queue: &PlaybackQueue) -> Result<()> {
        let params = json!({
            "playbackQueueId": queue.id,
            "playbackQueueName": queue.name,
            "countAll": queue.len(),
            "lastChanged": queue.changed_timestamp,
        });
        self.broadcast("playbackQueueChanged", params).await
    }

    async fn broadcast(&self, method: &str, params: Value) -> Result<()> {
        let envelope = RpcEnvelope::notification(method, Some(params));
        let result = self
            .transport
            .send(None, Capability::Controller, envelope.encode())
            .await;
        if let Err(e) = &result {
            warn!(method, error = %e, "notification broadcast failed");
        }
        result
    }
}

impl std::fmt::Debug for NotificationEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEmitter").finish_non_exhaustive()
    }
}

/// The wire shape of a player status, shared between the status
/// notification and the `getPlayerStatus` response
pub(crate) fn status_params(
    status: &PlayerStatus,
    cloud: CloudCoreStatus,
    user_id: Option<String>,
) -> Value {
    json!({
        "playing": status.playing,
        "playbackQueuePos": status.current_index,
        "seekPos": status.seek_pos,
        "track": status.current_item(),
        "volumeLevel": status.volume,
        "muted": status.muted,
        "playbackQueueMode": status.queue_mode,
        "cloudCoreStatus": cloud,
        "userId": user_id,
    })
}
