//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::VigilError;

/// Default bind address for the HTTP/WebSocket server.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:5001";

/// Default filename for the webhook database.
pub const DEFAULT_DB_FILENAME: &str = "webhooks.db";

/// Default `limit` for the recent-webhooks query.
pub const DEFAULT_RECENT_LIMIT: usize = 50;

/// Default age threshold (days) for the cleanup endpoint.
pub const DEFAULT_CLEANUP_DAYS: u32 = 30;

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP/WebSocket server binds to.
    pub listen: String,
    /// Path to the SQLite webhook database.
    pub db_path: PathBuf,
    /// Default number of records returned by the recent-webhooks query.
    pub recent_limit: usize,
    /// Default age threshold (days) applied by the cleanup endpoint.
    pub cleanup_days: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_FILENAME),
            recent_limit: DEFAULT_RECENT_LIMIT,
            cleanup_days: DEFAULT_CLEANUP_DAYS,
        }
    }
}

impl ServerConfig {
    /// Parse the configured listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, VigilError> {
        self.listen
            .parse()
            .map_err(|e| VigilError::ConfigError(format!("invalid listen address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listen_addr_parses() {
        let config = ServerConfig::default();
        let addr = config.listen_addr().expect("default listen should parse");
        assert_eq!(addr.port(), 5001);
    }

    #[test]
    fn bad_listen_addr_is_a_config_error() {
        let config = ServerConfig {
            listen: "not-an-address".to_string(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            config.listen_addr(),
            Err(VigilError::ConfigError(_))
        ));
    }
}
