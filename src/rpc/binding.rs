use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::cloud::ContentService;
use crate::error::{MeshError, Result};
use crate::transport::MessageTransport;
use crate::types::{Capability, PeerId, PlayerConfig, ServiceInfo, StreamingRef};

use super::envelope::RpcEnvelope;

/// Pairs outbound JSON-RPC requests with inbound responses for one peer
///
/// A binding is created when its peer connects and dropped when the peer
/// disconnects; dropping it fails any in-flight requests with a closed
/// channel, which surfaces as a timeout to callers.
pub struct RpcBinding {
    peer: PeerId,
    target: Capability,
    transport: Arc<dyn MessageTransport>,
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<RpcEnvelope>>>,
    timeout: Duration,
}

impl RpcBinding {
    /// Create a binding addressing `peer` in the given capability role
    #[must_use]
    pub fn new(
        peer: PeerId,
        target: Capability,
        transport: Arc<dyn MessageTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            peer,
            target,
            transport,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// The peer this binding addresses
    #[must_use]
    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    /// The capability role this binding addresses
    #[must_use]
    pub fn target(&self) -> Capability {
        self.target
    }

    /// Send a request and wait for the matching response
    ///
    /// # Errors
    ///
    /// [`MeshError::Transport`] if sending fails, [`MeshError::Timeout`]
    /// if no response arrives in time, [`MeshError::Rpc`] if the peer
    /// responds with an error.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        let envelope = RpcEnvelope::request(id, method, params);
        trace!(peer = %self.peer, method, id, "sending request");
        if let Err(e) = self
            .transport
            .send(Some(&self.peer), self.target, envelope.encode())
            .await
        {
            self.pending.lock().unwrap().remove(&id);
            return Err(e);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            // Elapsed, or the binding was dropped mid-flight
            Ok(Err(_)) | Err(_) => {
                self.pending.lock().unwrap().remove(&id);
                return Err(MeshError::Timeout {
                    duration: self.timeout,
                });
            }
        };

        if let Some(fault) = response.error {
            return Err(MeshError::Rpc {
                code: fault.code,
                message: fault.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Send a fire-and-forget notification
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Transport`] if sending fails.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        let envelope = RpcEnvelope::notification(method, params);
        self.transport
            .send(Some(&self.peer), self.target, envelope.encode())
            .await
    }

    /// Offer a response envelope to this binding
    ///
    /// Returns `true` when the response matched an in-flight request and
    /// was claimed, `false` when it belongs elsewhere.
    pub fn handle_response(&self, envelope: &RpcEnvelope) -> bool {
        let Some(id) = envelope.numeric_id() else {
            return false;
        };
        let Some(tx) = self.pending.lock().unwrap().remove(&id) else {
            return false;
        };
        debug!(peer = %self.peer, id, "response matched in-flight request");
        // The receiver may have timed out; a dropped receiver is fine
        let _ = tx.send(envelope.clone());
        true
    }

    /// Number of in-flight requests, for diagnostics
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

impl std::fmt::Debug for RpcBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcBinding")
            .field("peer", &self.peer)
            .field("target", &self.target)
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}

/// Content-service access over a peer's SERVICE role
///
/// Wraps an [`RpcBinding`] and exposes the peer as a
/// [`ContentService`], the same seam online services implement.
#[derive(Debug)]
pub struct ContentBinding {
    binding: RpcBinding,
}

impl ContentBinding {
    /// Create a content binding for a discovered service peer
    #[must_use]
    pub fn new(
        peer: PeerId,
        transport: Arc<dyn MessageTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            binding: RpcBinding::new(peer, Capability::Service, transport, timeout),
        }
    }

    /// The peer this binding addresses
    #[must_use]
    pub fn peer(&self) -> &PeerId {
        self.binding.peer()
    }

    /// Offer a response envelope; see [`RpcBinding::handle_response`]
    pub fn handle_response(&self, envelope: &RpcEnvelope) -> bool {
        self.binding.handle_response(envelope)
    }
}

#[async_trait]
impl ContentService for ContentBinding {
    async fn get_service_information(&self) -> Result<ServiceInfo> {
        let result = self
            .binding
            .request("getServiceInformation", None)
            .await
            .map_err(|e| MeshError::MetadataFetch {
                peer: self.binding.peer().to_string(),
                message: e.to_string(),
            })?;
        serde_json::from_value(result).map_err(|e| MeshError::MetadataFetch {
            peer: self.binding.peer().to_string(),
            message: e.to_string(),
        })
    }

    async fn get_item_streaming_ref(&self, item_id: &str) -> Result<StreamingRef> {
        let result = self
            .binding
            .request("getItemStreamingRef", Some(json!({ "itemId": item_id })))
            .await
            .map_err(|e| MeshError::StreamingResolution {
                message: e.to_string(),
            })?;
        serde_json::from_value(result).map_err(|e| MeshError::StreamingResolution {
            message: e.to_string(),
        })
    }
}

/// Player access over a peer's PLAYER role
#[derive(Debug)]
pub struct PlayerBinding {
    binding: RpcBinding,
}

impl PlayerBinding {
    /// Create a player binding for a discovered player peer
    #[must_use]
    pub fn new(
        peer: PeerId,
        transport: Arc<dyn MessageTransport>,
        timeout: Duration,
    ) -> Self {
        Self {
            binding: RpcBinding::new(peer, Capability::Player, transport, timeout),
        }
    }

    /// The peer this binding addresses
    #[must_use]
    pub fn peer(&self) -> &PeerId {
        self.binding.peer()
    }

    /// Offer a response envelope; see [`RpcBinding::handle_response`]
    pub fn handle_response(&self, envelope: &RpcEnvelope) -> bool {
        self.binding.handle_response(envelope)
    }

    /// Fetch the peer's player configuration
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::MetadataFetch`] when the request fails or
    /// the response does not parse.
    pub async fn get_player_configuration(&self) -> Result<PlayerConfig> {
        let result = self
            .binding
            .request("getPlayerConfiguration", None)
            .await
            .map_err(|e| MeshError::MetadataFetch {
                peer: self.binding.peer().to_string(),
                message: e.to_string(),
            })?;
        serde_json::from_value(result).map_err(|e| MeshError::MetadataFetch {
            peer: self.binding.peer().to_string(),
            message: e.to_string(),
        })
    }

    /// Send a raw command request to the player
    ///
    /// # Errors
    ///
    /// Same kinds as [`RpcBinding::request`].
    pub async fn send_command(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.binding.request(method, params).await
    }
}
