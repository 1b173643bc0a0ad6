//! Manages all connected subscribers and broadcast fan-out.

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::PushEvent;

/// Per-subscriber channel capacity. A subscriber that falls this many
/// events behind is considered failed and is dropped.
const SUBSCRIBER_BUFFER: usize = 64;

/// An opaque handle identifying one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(Uuid);

struct Subscriber {
    tx: mpsc::Sender<PushEvent>,
    connected_at: Instant,
}

/// Tracks the set of currently connected live-delivery channels.
///
/// All mutation goes through the internal mutex, so registration,
/// unregistration, and broadcast are safe under arbitrary concurrent
/// interleaving. The lock is never held across a send.
pub struct SubscriberRegistry {
    subscribers: Mutex<HashMap<Uuid, Subscriber>>,
    buffer: usize,
}

impl SubscriberRegistry {
    /// Create an empty registry with the default per-subscriber buffer.
    pub fn new() -> Self {
        Self::with_buffer(SUBSCRIBER_BUFFER)
    }

    /// Create a registry with an explicit per-subscriber buffer capacity.
    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// Register a new subscriber.
    ///
    /// Returns the handle and the receiving end of its event channel. A
    /// `connection_established` event is already queued on the channel when
    /// this returns.
    pub fn register(&self) -> (SubscriberHandle, mpsc::Receiver<PushEvent>) {
        let (tx, rx) = mpsc::channel(self.buffer);

        // The channel is empty at this point, so the handshake event
        // cannot fail to queue.
        let _ = tx.try_send(PushEvent::connection_established());

        let id = Uuid::new_v4();
        let mut subscribers = self.subscribers.lock();
        subscribers.insert(
            id,
            Subscriber {
                tx,
                connected_at: Instant::now(),
            },
        );
        debug!(subscriber = %id, total = subscribers.len(), "subscriber registered");

        (SubscriberHandle(id), rx)
    }

    /// Remove a subscriber. Idempotent; its channel closes when the last
    /// sender is dropped.
    pub fn unregister(&self, handle: &SubscriberHandle) {
        let mut subscribers = self.subscribers.lock();
        if let Some(sub) = subscribers.remove(&handle.0) {
            debug!(
                subscriber = %handle.0,
                connected_secs = sub.connected_at.elapsed().as_secs(),
                total = subscribers.len(),
                "subscriber unregistered"
            );
        }
    }

    /// Deliver an event to every currently registered subscriber.
    ///
    /// Each delivery is a bounded, non-blocking send attempt. A subscriber
    /// whose channel is full or closed is unregistered and does not affect
    /// delivery to the rest. Returns the number of subscribers that
    /// accepted the event.
    pub fn broadcast(&self, event: &PushEvent) -> usize {
        let targets: Vec<(Uuid, mpsc::Sender<PushEvent>)> = {
            let subscribers = self.subscribers.lock();
            subscribers
                .iter()
                .map(|(id, sub)| (*id, sub.tx.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut failed: Vec<Uuid> = Vec::new();

        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(subscriber = %id, error = %e, "dropping subscriber after failed send");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.subscribers.lock();
            for id in failed {
                subscribers.remove(&id);
            }
        }

        delivered
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event(description: &str) -> PushEvent {
        PushEvent::alert(vigil_ingest::normalize(&serde_json::json!({
            "rule": {"level": 9, "description": description}
        })))
    }

    #[test]
    fn registration_queues_the_handshake_event_first() {
        let registry = SubscriberRegistry::new();
        let (_handle, mut rx) = registry.register();

        let first = rx.try_recv().expect("handshake event should be queued");
        assert!(matches!(first, PushEvent::ConnectionEstablished { .. }));
    }

    #[test]
    fn broadcast_reaches_every_subscriber() {
        let registry = SubscriberRegistry::new();
        let (_h1, mut rx1) = registry.register();
        let (_h2, mut rx2) = registry.register();

        let delivered = registry.broadcast(&sample_event("fan out"));
        assert_eq!(delivered, 2);

        // Skip the handshake event on each channel.
        rx1.try_recv().unwrap();
        rx2.try_recv().unwrap();
        assert!(matches!(rx1.try_recv().unwrap(), PushEvent::Alert { .. }));
        assert!(matches!(rx2.try_recv().unwrap(), PushEvent::Alert { .. }));
    }

    #[test]
    fn failed_subscriber_is_isolated_and_dropped() {
        let registry = SubscriberRegistry::new();
        let (h1, rx1) = registry.register();
        let (_h2, mut rx2) = registry.register();

        // Subscriber 1's receiving side goes away mid-session.
        drop(rx1);

        let delivered = registry.broadcast(&sample_event("isolation"));
        assert_eq!(delivered, 1);
        assert_eq!(registry.subscriber_count(), 1);

        rx2.try_recv().unwrap();
        assert!(matches!(rx2.try_recv().unwrap(), PushEvent::Alert { .. }));

        // Unregistering the already-dropped handle is a no-op.
        registry.unregister(&h1);
        assert_eq!(registry.subscriber_count(), 1);
    }

    #[test]
    fn slow_subscriber_with_full_backlog_is_dropped() {
        let registry = SubscriberRegistry::with_buffer(2);
        let (_handle, _rx) = registry.register();

        // Buffer: handshake + one alert. The next broadcast overflows.
        assert_eq!(registry.broadcast(&sample_event("one")), 1);
        assert_eq!(registry.broadcast(&sample_event("two")), 0);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = SubscriberRegistry::new();
        let (handle, _rx) = registry.register();
        registry.unregister(&handle);
        registry.unregister(&handle);
        assert_eq!(registry.subscriber_count(), 0);
    }

    #[test]
    fn broadcast_with_no_subscribers_delivers_to_none() {
        let registry = SubscriberRegistry::new();
        assert_eq!(registry.broadcast(&sample_event("nobody home")), 0);
    }
}
