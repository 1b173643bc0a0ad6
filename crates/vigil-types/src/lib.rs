//! Core types shared across all Vigil crates.
//!
//! Defines the canonical [`Alert`] record, the severity and alert-type
//! classification enums, server configuration, and the shared error type
//! used by the normalizer, store, hub, and server.

pub mod alert;
pub mod config;
pub mod error;

pub use alert::{
    Alert, AlertData, AlertStatus, AlertType, Decoder, Mitre, ReportingAgent, Rule, Severity,
};
pub use config::ServerConfig;
pub use error::VigilError;
