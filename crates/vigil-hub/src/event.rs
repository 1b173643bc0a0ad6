//! The push-event envelope sent over live delivery channels.

use serde::{Deserialize, Serialize};

use vigil_types::Alert;

/// A server-push event, discriminated by a `type` field on the wire.
///
/// The channel is read-only from the client's perspective; these are the
/// only message types it will ever receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// Sent once, immediately after a successful handshake, so the client
    /// can confirm establishment before the first real alert arrives.
    ConnectionEstablished { message: String },
    /// A normalized alert.
    Alert { payload: Alert },
}

impl PushEvent {
    /// The handshake acknowledgment.
    pub fn connection_established() -> Self {
        PushEvent::ConnectionEstablished {
            message: "Connected to webhook server".to_string(),
        }
    }

    /// Wrap a normalized alert for delivery.
    pub fn alert(alert: Alert) -> Self {
        PushEvent::Alert { payload: alert }
    }
}
