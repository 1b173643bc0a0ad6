//! WebhookStore: SQLite-backed append-mostly webhook log.

use std::path::Path;

use chrono::{Duration, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use vigil_types::{Alert, VigilError};

/// A persisted webhook record.
///
/// The store-assigned `id` is independent of the alert's own `id` field;
/// the store never interprets the payload it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredWebhook {
    /// Store-assigned monotonic identifier.
    pub id: i64,
    /// Store-side RFC-3339 timestamp assigned at write time.
    pub timestamp: String,
    /// The serialized alert, parsed back to JSON for callers.
    pub data: Value,
}

/// An append-mostly webhook log backed by SQLite.
pub struct WebhookStore {
    conn: Connection,
}

impl WebhookStore {
    /// Open (or create) the webhook log at the given path.
    ///
    /// Enables WAL mode and creates the `webhooks` table and its timestamp
    /// index if they do not exist.
    pub fn open(path: &Path) -> Result<Self, VigilError> {
        let conn = Connection::open(path)
            .map_err(|e| VigilError::StoreError(format!("failed to open database: {e}")))?;
        Self::init(conn)
    }

    /// Open an in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, VigilError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| VigilError::StoreError(format!("failed to open database: {e}")))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, VigilError> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| VigilError::StoreError(format!("failed to set WAL mode: {e}")))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS webhooks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                data TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_webhooks_timestamp ON webhooks(timestamp);",
        )
        .map_err(|e| VigilError::StoreError(format!("failed to create schema: {e}")))?;

        info!("webhook store opened");
        Ok(Self { conn })
    }

    /// Append an alert to the log, stamping a store-side timestamp.
    ///
    /// Durable before returning. Failures are returned as-is: retry policy
    /// belongs to the caller, not the store.
    pub fn append(&self, alert: &Alert) -> Result<StoredWebhook, VigilError> {
        let timestamp = Utc::now().to_rfc3339();
        let data = serde_json::to_string(alert)
            .map_err(|e| VigilError::StoreError(format!("failed to serialize alert: {e}")))?;

        self.conn
            .execute(
                "INSERT INTO webhooks (timestamp, data) VALUES (?1, ?2)",
                params![timestamp, data],
            )
            .map_err(|e| VigilError::StoreError(format!("failed to insert webhook: {e}")))?;

        let id = self.conn.last_insert_rowid();
        let data = serde_json::from_str(&data)
            .map_err(|e| VigilError::StoreError(format!("failed to re-parse payload: {e}")))?;

        Ok(StoredWebhook {
            id,
            timestamp,
            data,
        })
    }

    /// Return the last `limit` records, most recent first.
    ///
    /// Timestamp collisions tie-break on store id descending, so insertion
    /// order is honored deterministically.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredWebhook>, VigilError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, data FROM webhooks
                 ORDER BY timestamp DESC, id DESC LIMIT ?1",
            )
            .map_err(|e| VigilError::StoreError(format!("recent prepare failed: {e}")))?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| VigilError::StoreError(format!("recent query failed: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, timestamp, raw) =
                row.map_err(|e| VigilError::StoreError(format!("recent read failed: {e}")))?;
            let data = serde_json::from_str(&raw)
                .map_err(|e| VigilError::StoreError(format!("stored payload unparseable: {e}")))?;
            records.push(StoredWebhook {
                id,
                timestamp,
                data,
            });
        }
        Ok(records)
    }

    /// Delete records older than the given number of days. Returns the
    /// number removed. Maintenance only; never scheduled by the store.
    pub fn prune(&self, older_than_days: u32) -> Result<usize, VigilError> {
        let cutoff = (Utc::now() - Duration::days(i64::from(older_than_days))).to_rfc3339();
        let removed = self
            .conn
            .execute("DELETE FROM webhooks WHERE timestamp < ?1", params![cutoff])
            .map_err(|e| VigilError::StoreError(format!("prune failed: {e}")))?;

        info!(removed, older_than_days, "pruned webhook log");
        Ok(removed)
    }

    /// Total number of records in the log.
    pub fn count(&self) -> Result<usize, VigilError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM webhooks", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|c| c as usize)
            .map_err(|e| VigilError::StoreError(format!("count failed: {e}")))
    }

    /// Connectivity probe for the health endpoint.
    pub fn ping(&self) -> bool {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}
