//! End-to-end player flow: remote commands arrive over the transport,
//! drive the playback engine and produce responses plus broadcast
//! notifications.

use std::sync::Arc;

use serde_json::json;

use audiomesh::router::InboundMessage;
use audiomesh::rpc::RpcEnvelope;
use audiomesh::testing::{MockCloud, MockScrobble, MockTransport, SentMessage};
use audiomesh::{Capability, MemorySettings, MeshConfig, PlayerNode, QueueMode};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn request_from_controller(id: u64, method: &str, params: serde_json::Value) -> InboundMessage {
    InboundMessage {
        sender: "ctrl-1".into(),
        sender_capability: Capability::Controller,
        recipient_capability: Capability::Player,
        payload: RpcEnvelope::request(id, method, Some(params)).encode(),
    }
}

fn responses_to_controller(sent: &[SentMessage]) -> Vec<RpcEnvelope> {
    sent.iter()
        .filter(|m| m.target.as_ref().is_some_and(|t| t.as_str() == "ctrl-1"))
        .map(SentMessage::envelope)
        .collect()
}

fn broadcasts(sent: &[SentMessage]) -> Vec<RpcEnvelope> {
    sent.iter()
        .filter(|m| m.target.is_none())
        .map(SentMessage::envelope)
        .collect()
}

#[tokio::test]
async fn player_executes_remote_transport_commands() {
    init_tracing();
    let transport = Arc::new(MockTransport::new());
    let scrobble = Arc::new(MockScrobble::new());
    let player = PlayerNode::new(
        MeshConfig::default(),
        Arc::new(MockCloud::new()),
        Arc::clone(&transport) as _,
        Arc::new(MemorySettings::new()) as _,
        Some(Arc::clone(&scrobble) as _),
    );
    player.start().await.unwrap();
    transport.take_sent();

    // Load a two-track queue
    player
        .on_message(request_from_controller(
            1,
            "setTracks",
            json!({
                "playbackQueueId": "q-1",
                "items": [
                    {
                        "id": "svc:1", "text": "First", "type": "track",
                        "streamingRefs": [{ "url": "http://host/1.mp3" }],
                        "itemAttributes": { "duration": 5.0 },
                    },
                    {
                        "id": "svc:2", "text": "Second", "type": "track",
                        "streamingRefs": [{ "url": "http://host/2.mp3" }],
                        "itemAttributes": { "duration": 3.0 },
                    },
                ],
            }),
        ))
        .await;

    let sent = transport.take_sent();
    let responses = responses_to_controller(&sent);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].result.as_ref().unwrap()["countAll"], json!(2));
    let queue_changed = broadcasts(&sent);
    assert_eq!(queue_changed.len(), 1);
    assert_eq!(queue_changed[0].method.as_deref(), Some("playbackQueueChanged"));
    assert_eq!(queue_changed[0].params.as_ref().unwrap()["countAll"], json!(2));

    // Start playback
    player
        .on_message(request_from_controller(2, "play", json!({ "playing": true })))
        .await;
    player.shutdown();

    let sent = transport.take_sent();
    let responses = responses_to_controller(&sent);
    assert_eq!(responses[0].result.as_ref().unwrap()["playing"], json!(true));
    let status_broadcasts = broadcasts(&sent);
    assert_eq!(status_broadcasts[0].method.as_deref(), Some("playerStatusChanged"));
    let params = status_broadcasts[0].params.as_ref().unwrap();
    assert_eq!(params["playing"], json!(true));
    assert_eq!(params["playbackQueuePos"], json!(0));
    assert_eq!(params["track"]["id"], json!("svc:1"));

    // Drive playback through the first track boundary
    for _ in 0..6 {
        player.engine().on_tick().await;
    }
    let status = player.status();
    assert!(status.playing);
    assert_eq!(status.current_index, Some(1));
    assert_eq!(scrobble.reports().len(), 1);
    assert_eq!(scrobble.reports()[0].0.id, "svc:1");

    // The advance broadcast carries the new track
    let advance_broadcasts = broadcasts(&transport.take_sent());
    let last = advance_broadcasts.last().unwrap();
    assert_eq!(last.params.as_ref().unwrap()["track"]["id"], json!("svc:2"));

    // Pause captures position and reports the second track
    player
        .on_message(request_from_controller(3, "play", json!({ "playing": false })))
        .await;
    assert!(!player.status().playing);
    assert_eq!(scrobble.reports().len(), 2);
}

#[tokio::test]
async fn player_survives_malformed_and_unknown_traffic() {
    init_tracing();
    let transport = Arc::new(MockTransport::new());
    let player = PlayerNode::new(
        MeshConfig::default(),
        Arc::new(MockCloud::new()),
        Arc::clone(&transport) as _,
        Arc::new(MemorySettings::new()) as _,
        None,
    );
    player.start().await.unwrap();
    transport.take_sent();

    // Garbage payload: dropped without a reply
    player
        .on_message(InboundMessage {
            sender: "ctrl-1".into(),
            sender_capability: Capability::Controller,
            recipient_capability: Capability::Player,
            payload: bytes::Bytes::from_static(b"\xff\xfe not json"),
        })
        .await;
    assert_eq!(transport.sent_count(), 0);

    // Unknown method: answered with a method-not-found error
    player
        .on_message(request_from_controller(7, "levitate", json!({})))
        .await;
    let responses = responses_to_controller(&transport.take_sent());
    assert_eq!(responses[0].error.as_ref().unwrap().code, -32601);

    // The player still works afterwards
    player
        .on_message(request_from_controller(
            8,
            "setPlaybackQueueMode",
            json!({ "playbackQueueMode": "QUEUE_REPEAT" }),
        ))
        .await;
    assert_eq!(player.status().queue_mode, QueueMode::Repeat);
}
