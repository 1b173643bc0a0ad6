//! At-least-once delivery via reconnect-time history reconciliation.
//!
//! The hub delivers at most once per connection and buffers nothing for
//! absent subscribers; the overall guarantee comes from merging a recent
//! history fetch with dedup by alert id. These tests drive the registry,
//! store, and working set together, without the network in the way.

mod common;

use serde_json::Value;

use vigil_client::AlertManager;
use vigil_hub::{PushEvent, SubscriberRegistry};
use vigil_ingest::normalize;
use vigil_store::WebhookStore;
use vigil_types::Alert;

use common::sample_payload;

fn stored_alerts(store: &WebhookStore, limit: usize) -> Vec<Alert> {
    store
        .recent(limit)
        .expect("recent query should succeed")
        .into_iter()
        .map(|record| serde_json::from_value(record.data).expect("stored payload is an alert"))
        .collect()
}

#[test]
fn missed_events_are_reconstructed_from_history_without_duplicates() {
    let store = WebhookStore::open_in_memory().unwrap();
    let registry = SubscriberRegistry::new();
    let mut manager = AlertManager::new();

    // Connected for the first two events.
    let (handle, mut rx) = registry.register();
    assert!(matches!(
        rx.try_recv().unwrap(),
        PushEvent::ConnectionEstablished { .. }
    ));

    let payloads: Vec<Value> = (0..5).map(|i| sample_payload(i, 8)).collect();

    for payload in &payloads[..2] {
        let alert = normalize(payload);
        store.append(&alert).unwrap();
        assert_eq!(registry.broadcast(&PushEvent::alert(alert)), 1);
    }
    while let Ok(event) = rx.try_recv() {
        if let PushEvent::Alert { payload } = event {
            manager.add(payload);
        }
    }
    assert_eq!(manager.len(), 2);

    // Drop the connection; three more events flow past unseen.
    drop(rx);
    registry.unregister(&handle);
    for payload in &payloads[2..] {
        let alert = normalize(payload);
        store.append(&alert).unwrap();
        registry.broadcast(&PushEvent::alert(alert));
    }

    // Reconnect and reconcile: fetch at least as many records as were
    // ingested, merge with dedup by id.
    let (_handle, _rx) = registry.register();
    let added = manager.merge(stored_alerts(&store, 10));

    assert_eq!(added, 3, "only the missed events are new");
    assert_eq!(manager.len(), 5);

    // The merged view holds every ingested alert exactly once.
    let mut ids: Vec<&str> = manager.alerts().iter().map(|a| a.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 5);
}

#[test]
fn merged_view_matches_live_view_for_redelivered_payloads() {
    // The same logical event seen live and again via history must collapse
    // onto one record; derived ids make that hold even without source ids.
    let store = WebhookStore::open_in_memory().unwrap();
    let mut manager = AlertManager::new();

    let payload = sample_payload(7, 10);
    let live = normalize(&payload);
    store.append(&live).unwrap();
    manager.add(live.clone());

    let added = manager.merge(stored_alerts(&store, 10));
    assert_eq!(added, 0);
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.alerts()[0].id, live.id);
}

#[test]
fn classification_survives_the_store_round_trip() {
    let store = WebhookStore::open_in_memory().unwrap();
    let alert = normalize(&serde_json::json!({
        "_source": {
            "timestamp": "2026-08-06T09:00:00+00:00",
            "rule": {"id": 554, "level": 7, "groups": ["ossec"]},
            "syscheck": {"path": "/etc/passwd", "event": "modified"},
            "agent": {"id": "002", "name": "db-01", "ip": "10.0.0.9"}
        }
    }));
    store.append(&alert).unwrap();

    let restored = &stored_alerts(&store, 1)[0];
    assert_eq!(restored, &alert);
    assert_eq!(restored.alert_type.as_str(), "file_integrity");
    assert_eq!(restored.severity.as_str(), "medium");
    assert_eq!(restored.data.file_path.as_deref(), Some("/etc/passwd"));
}

#[test]
fn faulting_subscriber_does_not_affect_healthy_ones() {
    let registry = SubscriberRegistry::new();

    let (_ha, rx_a) = registry.register();
    let (_hb, mut rx_b) = registry.register();
    drop(rx_a); // A's channel fails mid-session.

    let event = PushEvent::alert(normalize(&sample_payload(11, 9)));
    let delivered = registry.broadcast(&event);

    // B still gets the event; the reported count excludes A.
    assert_eq!(delivered, 1);
    assert!(matches!(
        rx_b.try_recv().unwrap(),
        PushEvent::ConnectionEstablished { .. }
    ));
    assert!(matches!(rx_b.try_recv().unwrap(), PushEvent::Alert { .. }));
    assert_eq!(registry.subscriber_count(), 1);
}
