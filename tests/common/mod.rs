//! Shared helpers for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::net::SocketAddr;

use serde_json::{json, Value};
use tempfile::NamedTempFile;

use vigil_server::routes;
use vigil_server::state::AppState;
use vigil_store::WebhookStore;
use vigil_types::ServerConfig;

/// Create a temporary file for use as a test database.
pub fn temp_db() -> NamedTempFile {
    NamedTempFile::new().expect("should create temp file for webhook database")
}

/// Open a WebhookStore on the given temp file.
pub fn open_test_store(tmp: &NamedTempFile) -> WebhookStore {
    WebhookStore::open(tmp.path()).expect("should open webhook store")
}

/// Application state over an in-memory store.
pub fn memory_state() -> AppState {
    AppState::new(
        ServerConfig::default(),
        WebhookStore::open_in_memory().expect("should open in-memory store"),
    )
}

/// Application state over a file-backed store.
pub fn file_state(tmp: &NamedTempFile) -> AppState {
    AppState::new(ServerConfig::default(), open_test_store(tmp))
}

/// Serve the router on an ephemeral localhost port.
///
/// The server task runs until the test process exits.
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind ephemeral port");
    let addr = listener.local_addr().expect("listener should have an addr");

    tokio::spawn(async move {
        axum::serve(listener, routes::router(state))
            .await
            .expect("test server should serve");
    });

    addr
}

/// A webhook payload in the search-hit envelope shape.
pub fn sample_payload(seq: u32, level: u32) -> Value {
    json!({
        "_source": {
            "timestamp": format!("2026-08-06T10:00:{:02}+00:00", seq % 60),
            "rule": {
                "id": 5710 + seq,
                "level": level,
                "description": format!("Sample alert {seq}"),
                "groups": ["syslog"]
            },
            "agent": {"id": "001", "name": "web-01", "ip": "10.0.0.5"}
        }
    })
}
