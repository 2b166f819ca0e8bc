#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;
use crate::test_support::FakeHost;

fn view() -> ViewState {
    ViewState { x: 12.0, y: -4.0, zoom: 0.5 }
}

fn users(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| (*s).to_owned()).collect()
}

#[test]
fn sync_message_wire_shape() {
    let msg = SocketMessage::sync("gm", users(&["a", "b"]), view());
    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], json!("sync"));
    assert_eq!(value["sender"], json!("gm"));
    assert_eq!(value["users"], json!(["a", "b"]));
    assert_eq!(value["view"], json!({ "x": 12.0, "y": -4.0, "zoom": 0.5 }));
    assert!(value["timestamp"].as_i64().unwrap() > 0);
    assert!(value["id"].is_string());
}

#[test]
fn decode_accepts_host_payload() {
    let payload = json!({
        "id": Uuid::new_v4(),
        "type": "sync",
        "timestamp": 1_700_000_000_000_i64,
        "sender": "gm",
        "users": ["p1"],
        "view": { "x": 1.0, "y": 2.0, "zoom": 3.0 }
    });
    let msg = SocketMessage::decode(payload).unwrap();
    assert_eq!(msg.view_for("p1"), Some(ViewState { x: 1.0, y: 2.0, zoom: 3.0 }));
}

#[test]
fn decode_rejects_unknown_type() {
    let payload = json!({ "id": Uuid::new_v4(), "type": "ping", "timestamp": 0, "sender": "gm", "users": [] });
    let err = SocketMessage::decode(payload).unwrap_err();
    assert!(matches!(err, SyncError::Decode(_)));
}

#[test]
fn view_only_for_listed_users() {
    let msg = SocketMessage::sync("gm", users(&["p1"]), view());
    assert_eq!(msg.view_for("p1"), Some(view()));
    assert_eq!(msg.view_for("p2"), None);
}

#[test]
fn recipients_others_excludes_sender() {
    let all = users(&["gm", "p1", "p2"]);
    assert_eq!(recipients(all.clone(), "gm", Audience::Others), users(&["p1", "p2"]));
    assert_eq!(recipients(all, "gm", Audience::Everyone), users(&["gm", "p1", "p2"]));
}

#[test]
fn broadcast_fails_fast_before_ready() {
    let mut bus = FakeHost::new();
    bus.bus_ready = false;
    let msg = SocketMessage::sync("gm", users(&["p1"]), view());
    let err = broadcast(&mut bus, &msg).unwrap_err();
    assert!(matches!(err, SyncError::TransportNotInitialized));
    assert!(bus.emitted().is_empty());
}

#[test]
fn broadcast_emits_on_channel() {
    let mut bus = FakeHost::new();
    let msg = SocketMessage::sync("gm", users(&["p1"]), view());
    broadcast(&mut bus, &msg).unwrap();
    assert_eq!(
        bus.events,
        vec![crate::test_support::HostEvent::Emit(SYNC_CHANNEL.to_owned(), serde_json::to_value(&msg).unwrap())]
    );
}

#[test]
fn broadcast_propagates_transport_error() {
    let mut bus = FakeHost::new();
    bus.bus_rejects = true;
    let msg = SocketMessage::sync("gm", Vec::new(), view());
    assert!(matches!(broadcast(&mut bus, &msg), Err(SyncError::Transport(_))));
}
