use serde_json::json;

use crate::cloud::ServiceUrlResolver;
use crate::rpc::RpcEnvelope;
use crate::testing::{MockDisplay, MockTransport};
use crate::types::DeviceIdentity;

use super::*;

struct Fixture {
    handler: Arc<DiscoveryHandler>,
    registry: Arc<PeerRegistry>,
    transport: Arc<MockTransport>,
    display: Arc<MockDisplay>,
}

fn fixture() -> Fixture {
    let registry = Arc::new(PeerRegistry::new());
    let transport = Arc::new(MockTransport::new());
    let display = Arc::new(MockDisplay::new());
    let handler = Arc::new(
        DiscoveryHandler::new(
            Arc::clone(&registry),
            Arc::clone(&transport) as Arc<dyn MessageTransport>,
            Duration::from_secs(1),
        )
        .with_display(Arc::clone(&display) as Arc<dyn DisplaySink>),
    );
    Fixture {
        handler,
        registry,
        transport,
        display,
    }
}

fn connected(id: &str, caps: CapabilitySet) -> DiscoveryEvent {
    DiscoveryEvent::Connected {
        id: id.into(),
        name: Some(format!("{id}-name")),
        capabilities: caps,
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

#[tokio::test]
async fn test_connected_service_peer_gets_binding_and_fetch() {
    let f = fixture();
    f.handler
        .handle_event(connected("svc-peer", CapabilitySet::default().with_service()));

    let record = f.registry.get(&"svc-peer".into()).unwrap();
    assert!(record.service_binding.is_some());
    assert!(record.service_info.is_none());

    // The spawned fetch sends a getServiceInformation request
    wait_for(|| f.transport.sent_count() > 0).await;
    let sent = f.transport.take_sent().pop().unwrap();
    let envelope = sent.envelope();
    assert_eq!(envelope.method.as_deref(), Some("getServiceInformation"));

    // Answer it through the binding; the handler applies the metadata
    let response = RpcEnvelope::response(
        envelope.id.unwrap(),
        json!({ "id": "svc-1", "name": "Library", "serviceUrl": "http://svc.local" }),
    );
    let (_, service_binding) = f.registry.bindings_for(&"svc-peer".into());
    assert!(service_binding.unwrap().handle_response(&response));

    wait_for(|| {
        f.registry
            .get(&"svc-peer".into())
            .is_some_and(|r| r.service_info.is_some())
    })
    .await;
    assert_eq!(
        f.registry.service_url("svc-1").as_deref(),
        Some("http://svc.local")
    );
}

#[tokio::test]
async fn test_connected_player_peer_gets_binding_and_cloud_identity() {
    let f = fixture();
    f.handler.set_known_devices(vec![DeviceIdentity {
        id: "player-peer".to_string(),
        name: "Kitchen".to_string(),
        access_token: None,
    }]);

    f.handler
        .handle_event(connected("player-peer", CapabilitySet::default().with_player()));

    let record = f.registry.get(&"player-peer".into()).unwrap();
    assert!(record.player_binding.is_some());
    assert!(record.cloud_identity.is_some());

    wait_for(|| f.transport.sent_count() > 0).await;
    let envelope = f.transport.take_sent().pop().unwrap().envelope();
    assert_eq!(envelope.method.as_deref(), Some("getPlayerConfiguration"));
}

#[tokio::test]
async fn test_updated_for_unknown_peer_acts_as_connected() {
    let f = fixture();
    f.handler.handle_event(DiscoveryEvent::Updated {
        id: "ghost".into(),
        name: None,
        capabilities: CapabilitySet::default().with_controller(),
    });
    assert!(f.registry.contains(&"ghost".into()));
}

#[tokio::test]
async fn test_disconnected_removes_record() {
    let f = fixture();
    f.handler
        .handle_event(connected("peer-1", CapabilitySet::default().with_player()));
    assert!(f.registry.contains(&"peer-1".into()));

    f.handler
        .handle_event(DiscoveryEvent::Disconnected { id: "peer-1".into() });
    assert!(!f.registry.contains(&"peer-1".into()));

    // Disconnecting an unknown peer is harmless
    f.handler
        .handle_event(DiscoveryEvent::Disconnected { id: "peer-1".into() });
}

#[tokio::test]
async fn test_every_event_refreshes_display() {
    let f = fixture();
    f.handler
        .handle_event(connected("peer-1", CapabilitySet::default().with_player()));
    assert_eq!(f.display.refresh_count(), 1);

    f.handler
        .handle_event(DiscoveryEvent::Disconnected { id: "peer-1".into() });
    assert_eq!(f.display.refresh_count(), 2);
    assert!(f.display.last_snapshot().unwrap().peers.is_empty());
}

#[tokio::test]
async fn test_failed_metadata_fetch_leaves_metadata_absent() {
    let f = fixture();
    f.transport.set_failing(true);
    f.handler
        .handle_event(connected("svc-peer", CapabilitySet::default().with_service()));

    // Give the fetch task room to fail
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    let record = f.registry.get(&"svc-peer".into()).unwrap();
    assert!(record.service_info.is_none());
    // The binding itself survives for later traffic
    assert!(record.service_binding.is_some());
}
