use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use crate::rpc::{ContentBinding, PlayerBinding};
use crate::testing::MockTransport;
use crate::types::{CapabilitySet, ServiceInfo};

use super::*;

fn content_binding(peer: &str) -> Arc<ContentBinding> {
    Arc::new(ContentBinding::new(
        peer.into(),
        Arc::new(MockTransport::new()),
        Duration::from_secs(1),
    ))
}

fn player_binding(peer: &str) -> Arc<PlayerBinding> {
    Arc::new(PlayerBinding::new(
        peer.into(),
        Arc::new(MockTransport::new()),
        Duration::from_secs(1),
    ))
}

#[test]
fn test_upsert_and_get() {
    let registry = PeerRegistry::new();
    assert!(registry.is_empty());

    registry.upsert(
        "peer-1".into(),
        Some("Kitchen".to_string()),
        CapabilitySet::default().with_player(),
    );
    assert_eq!(registry.len(), 1);

    let record = registry.get(&"peer-1".into()).unwrap();
    assert_eq!(record.name.as_deref(), Some("Kitchen"));
    assert!(record.capabilities.player);
    assert!(!record.capabilities.service);
}

#[test]
fn test_remove_is_idempotent() {
    let registry = PeerRegistry::new();
    registry.upsert("peer-1".into(), None, CapabilitySet::default().with_service());

    assert!(registry.remove(&"peer-1".into()).is_some());
    assert!(registry.remove(&"peer-1".into()).is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_upsert_keeps_metadata_for_surviving_roles() {
    let registry = PeerRegistry::new();
    let id = PeerId::from("peer-1");
    registry.upsert(
        id.clone(),
        None,
        CapabilitySet::default().with_player().with_service(),
    );
    assert!(registry.attach_service_binding(&id, content_binding("peer-1")));
    assert!(registry.set_service_info(
        &id,
        ServiceInfo {
            id: "svc-1".to_string(),
            name: "Library".to_string(),
            service_url: None,
        },
    ));

    // Update keeps the service role, metadata survives
    registry.upsert(id.clone(), Some("Renamed".to_string()), CapabilitySet::default().with_service());
    let record = registry.get(&id).unwrap();
    assert!(record.service_binding.is_some());
    assert!(record.service_info.is_some());
    assert_eq!(record.name.as_deref(), Some("Renamed"));
}

#[test]
fn test_upsert_discards_metadata_for_dropped_roles() {
    let registry = PeerRegistry::new();
    let id = PeerId::from("peer-1");
    registry.upsert(
        id.clone(),
        None,
        CapabilitySet::default().with_player().with_service(),
    );
    registry.attach_service_binding(&id, content_binding("peer-1"));
    registry.attach_player_binding(&id, player_binding("peer-1"));

    // Peer re-announces as player only
    registry.upsert(id.clone(), None, CapabilitySet::default().with_player());
    let record = registry.get(&id).unwrap();
    assert!(record.service_binding.is_none());
    assert!(record.service_info.is_none());
    assert!(record.player_binding.is_some());
}

#[test]
fn test_attach_to_unknown_peer_is_rejected() {
    let registry = PeerRegistry::new();
    assert!(!registry.attach_service_binding(&"ghost".into(), content_binding("ghost")));
    assert!(!registry.set_player_config(&"ghost".into(), crate::types::PlayerConfig::default()));
}

#[test]
fn test_players_sorted_by_display_name() {
    let registry = PeerRegistry::new();
    registry.upsert("b-peer".into(), Some("Zulu".to_string()), CapabilitySet::default().with_player());
    registry.upsert("a-peer".into(), Some("Alpha".to_string()), CapabilitySet::default().with_player());
    // No name: falls back to the peer id
    registry.upsert("m-peer".into(), None, CapabilitySet::default().with_player());
    registry.upsert("svc".into(), None, CapabilitySet::default().with_service());

    let names: Vec<String> = registry
        .players()
        .iter()
        .map(|(id, record)| record.display_name(id).to_string())
        .collect();
    assert_eq!(names, vec!["Alpha", "Zulu", "m-peer"]);
}

#[test]
fn test_content_service_lookup_by_service_identity() {
    let registry = PeerRegistry::new();
    let id = PeerId::from("peer-1");
    registry.upsert(id.clone(), None, CapabilitySet::default().with_service());
    registry.attach_service_binding(&id, content_binding("peer-1"));
    registry.set_service_info(
        &id,
        ServiceInfo {
            id: "svc-1".to_string(),
            name: "Library".to_string(),
            service_url: Some("http://svc.local".to_string()),
        },
    );

    assert!(registry.content_service("svc-1").is_some());
    // Peer id works as a fallback identity
    assert!(registry.content_service("peer-1").is_some());
    assert!(registry.content_service("unknown").is_none());

    assert_eq!(
        registry.service_url("svc-1").as_deref(),
        Some("http://svc.local")
    );
    assert_eq!(registry.service_url("unknown"), None);
}

#[test]
fn test_snapshot_reflects_metadata() {
    let registry = PeerRegistry::new();
    let id = PeerId::from("peer-1");
    registry.upsert(id.clone(), Some("Kitchen".to_string()), CapabilitySet::default().with_player());
    registry.set_player_config(&id, crate::types::PlayerConfig::default());

    let snapshot = registry.snapshot();
    assert_eq!(snapshot.peers.len(), 1);
    let summary = &snapshot.peers[0];
    assert!(summary.has_player_config);
    assert!(!summary.has_service_info);
    assert!(!summary.registered);
}

fn capability_strategy() -> impl Strategy<Value = CapabilitySet> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(player, service, controller)| {
        CapabilitySet {
            player,
            service,
            controller,
        }
    })
}

proptest! {
    // Whatever interleaving of announcements arrives, the record for each
    // peer reflects exactly the last announcement for that peer.
    #[test]
    fn prop_upsert_last_write_wins(
        updates in proptest::collection::vec(
            (0u8..4, proptest::option::of("[a-z]{1,8}"), capability_strategy()),
            1..32,
        )
    ) {
        let registry = PeerRegistry::new();
        let mut expected: HashMap<u8, (Option<String>, CapabilitySet)> = HashMap::new();

        for (slot, name, caps) in updates {
            let id = PeerId::from(format!("peer-{slot}"));
            registry.upsert(id, name.clone(), caps);
            expected.insert(slot, (name, caps));
        }

        prop_assert_eq!(registry.len(), expected.len());
        for (slot, (name, caps)) in expected {
            let record = registry.get(&format!("peer-{slot}").into()).unwrap();
            prop_assert_eq!(record.name, name);
            prop_assert_eq!(record.capabilities, caps);
        }
    }
}
