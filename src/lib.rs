//! Vigil: security-alert webhook ingestion and real-time distribution.
//!
//! Facade crate re-exporting the workspace members:
//!
//! - [`types`]: the canonical [`Alert`](vigil_types::Alert) record and
//!   shared configuration/error types
//! - [`ingest`]: payload normalization, classification, and dedup
//! - [`store`]: the SQLite webhook log
//! - [`hub`]: the subscriber registry and broadcast fan-out
//! - [`server`]: the HTTP/WebSocket surface
//! - [`client`]: the live-channel client and alert working set

pub use vigil_client as client;
pub use vigil_hub as hub;
pub use vigil_ingest as ingest;
pub use vigil_server as server;
pub use vigil_store as store;
pub use vigil_types as types;
