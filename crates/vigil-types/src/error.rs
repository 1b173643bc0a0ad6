//! Error types shared across all Vigil crates.

/// Errors that can occur across the Vigil runtime.
///
/// Each variant corresponds to a different subsystem: webhook store,
/// subscriber hub, client transport, or configuration. Per-subscriber send
/// failures and best-effort persistence failures are handled at their
/// origin and never surface through this type as fatal errors.
#[derive(Debug, thiserror::Error)]
pub enum VigilError {
    #[error("webhook store error: {0}")]
    StoreError(String),

    #[error("subscriber hub error: {0}")]
    HubError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("configuration error: {0}")]
    ConfigError(String),
}
