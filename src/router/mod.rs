//! Inbound message routing
//!
//! Every payload the transport delivers passes through one
//! [`MessageRouter`]. Routing is driven by the capability role the
//! message was addressed to, never by inspecting the method name, so
//! unknown methods still reach the right handler and fail there.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::engine::PlayerCommandService;
use crate::registry::PeerRegistry;
use crate::rpc::RpcEnvelope;
use crate::transport::MessageTransport;
use crate::types::{Capability, PeerId};


/// A payload delivered by the transport, with its addressing
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Peer that sent the message
    pub sender: PeerId,

    /// Role the sender was acting in
    pub sender_capability: Capability,

    /// Role of ours the message was addressed to
    pub recipient_capability: Capability,

    /// Raw payload bytes
    pub payload: Bytes,
}

/// Routes inbound payloads to bindings and command handlers
///
/// Routing failures are logged and swallowed; a malformed or unroutable
/// message never takes the process down and never produces a reply.
pub struct MessageRouter {
    registry: Arc<PeerRegistry>,
    transport: Arc<dyn MessageTransport>,
    commands: Option<Arc<PlayerCommandService>>,
}

impl MessageRouter {
    /// Create a router without a local player role
    #[must_use]
    pub fn new(registry: Arc<PeerRegistry>, transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            registry,
            transport,
            commands: None,
        }
    }

    /// Attach the local player's command handler
    ///
    /// Requests addressed to our PLAYER role are dispatched to it.
    #[must_use]
    pub fn with_command_service(mut self, commands: Arc<PlayerCommandService>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Route one inbound message
    ///
    /// Never fails: decode errors, unroutable messages and handler
    /// failures are logged and dropped.
    pub async fn route(&self, message: InboundMessage) {
        let envelope = match RpcEnvelope::decode(&message.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(sender = %message.sender, error = %e, "dropping undecodable payload");
                return;
            }
        };
        trace!(
            sender = %message.sender,
            recipient = ?message.recipient_capability,
            method = envelope.method.as_deref().unwrap_or("-"),
            "routing inbound message"
        );

        match message.recipient_capability {
            Capability::Controller => self.route_to_controller(&message, &envelope),
            Capability::Player => self.route_to_player(&message, envelope).await,
            Capability::Service => {
                // Local content hosting happens out-of-band; nothing on
                // this path expects service-addressed traffic.
                warn!(sender = %message.sender, "dropping message addressed to SERVICE role");
            }
        }
    }

    /// Responses addressed to our CONTROLLER role belong to a request we
    /// sent through one of the sender's bindings. The player binding gets
    /// first claim, then the service binding.
    fn route_to_controller(&self, message: &InboundMessage, envelope: &RpcEnvelope) {
        if !envelope.is_response() {
            warn!(sender = %message.sender, "dropping non-response addressed to CONTROLLER role");
            return;
        }
        let (player, service) = self.registry.bindings_for(&message.sender);
        if let Some(binding) = player {
            if binding.handle_response(envelope) {
                return;
            }
        }
        if let Some(binding) = service {
            if binding.handle_response(envelope) {
                return;
            }
        }
        debug!(sender = %message.sender, "response matched no in-flight request");
    }

    async fn route_to_player(&self, message: &InboundMessage, envelope: RpcEnvelope) {
        if envelope.is_response() {
            // A response to a content request we made while acting as a
            // player; whichever binding issued the request claims it.
            for binding in self.registry.content_bindings() {
                if binding.handle_response(&envelope) {
                    return;
                }
            }
            debug!(sender = %message.sender, "response matched no content binding");
            return;
        }

        let Some(commands) = &self.commands else {
            warn!(sender = %message.sender, "no player role here, dropping command");
            return;
        };
        if let Some(response) = commands.handle(&envelope).await {
            let result = self
                .transport
                .send(
                    Some(&message.sender),
                    message.sender_capability,
                    response.encode(),
                )
                .await;
            if let Err(e) = result {
                warn!(sender = %message.sender, error = %e, "failed to send command response");
            }
        }
    }
}

impl std::fmt::Debug for MessageRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageRouter")
            .field("has_command_service", &self.commands.is_some())
            .finish_non_exhaustive()
    }
}
