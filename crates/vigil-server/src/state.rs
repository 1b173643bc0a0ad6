//! Shared application state injected into every handler.

use std::sync::Arc;

use tokio::sync::Mutex;

use vigil_hub::SubscriberRegistry;
use vigil_ingest::RecentIds;
use vigil_store::WebhookStore;
use vigil_types::ServerConfig;

/// State shared by the HTTP handlers and the WebSocket accept loop.
///
/// The store and the duplicate-suppression set each serialize their own
/// mutations behind their own lock; the registry manages its membership
/// set internally. Nothing locks across subsystems, so persistence and
/// broadcast never serialize against each other.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub store: Arc<Mutex<WebhookStore>>,
    pub registry: Arc<SubscriberRegistry>,
    pub recent_ids: Arc<parking_lot::Mutex<RecentIds>>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: WebhookStore) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
            registry: Arc::new(SubscriberRegistry::new()),
            recent_ids: Arc::new(parking_lot::Mutex::new(RecentIds::new())),
        }
    }
}
