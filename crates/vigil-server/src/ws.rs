//! WebSocket push channel.
//!
//! Each connected viewer gets a registry subscription whose events are
//! pumped into the socket. The channel is read-only for the client; inbound
//! frames are consumed only to notice the close. A disconnect at any point
//! immediately removes the subscriber -- no partial-delivery state survives.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::state::AppState;

/// `GET /ws` -- upgrade and hand the socket to the session loop.
pub async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_session(socket, state))
}

async fn client_session(socket: WebSocket, state: AppState) {
    let (handle, mut events) = state.registry.register();
    info!(total = state.registry.subscriber_count(), "client connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    // The registry dropped us after a failed send.
                    break;
                };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize push event");
                        continue;
                    }
                };
                if sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(other)) => {
                        // Read-only channel: ignore anything the client sends.
                        debug!(?other, "ignoring client frame");
                    }
                }
            }
        }
    }

    state.registry.unregister(&handle);
    info!(total = state.registry.subscriber_count(), "client disconnected");
}
