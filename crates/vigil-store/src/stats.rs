//! Aggregate statistics over the webhook log.
//!
//! Backs the statistics endpoint: per-day counts over a trailing window,
//! bucketed by UTC day.

use chrono::{Duration, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use vigil_types::VigilError;

use crate::store::WebhookStore;

/// The trailing window covered by [`WebhookStore::daily_stats`].
const STATS_WINDOW_DAYS: i64 = 7;

/// Number of webhooks received on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// The day, as `YYYY-MM-DD`.
    pub date: String,
    pub count: usize,
}

impl WebhookStore {
    /// Per-day counts over the trailing 7-day window, most recent day first.
    ///
    /// Days with no records are absent rather than zero-filled, matching
    /// the grouped query shape.
    pub fn daily_stats(&self) -> Result<Vec<DailyCount>, VigilError> {
        let cutoff = (Utc::now() - Duration::days(STATS_WINDOW_DAYS)).to_rfc3339();

        let mut stmt = self
            .connection()
            .prepare(
                "SELECT substr(timestamp, 1, 10) AS day, COUNT(*)
                 FROM webhooks WHERE timestamp >= ?1
                 GROUP BY day ORDER BY day DESC",
            )
            .map_err(|e| VigilError::StoreError(format!("daily_stats prepare failed: {e}")))?;

        let rows = stmt
            .query_map(params![cutoff], |row| {
                Ok(DailyCount {
                    date: row.get(0)?,
                    count: row.get::<_, i64>(1)? as usize,
                })
            })
            .map_err(|e| VigilError::StoreError(format!("daily_stats query failed: {e}")))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| VigilError::StoreError(format!("daily_stats read failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_ingest::normalize;

    #[test]
    fn counts_are_bucketed_by_day_most_recent_first() {
        let store = WebhookStore::open_in_memory().unwrap();
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let yesterday = (Utc::now() - Duration::days(1))
            .format("%Y-%m-%d")
            .to_string();

        for ts in [
            format!("{yesterday}T08:00:00+00:00"),
            format!("{yesterday}T09:00:00+00:00"),
            format!("{today}T10:00:00+00:00"),
        ] {
            store
                .connection()
                .execute(
                    "INSERT INTO webhooks (timestamp, data) VALUES (?1, ?2)",
                    params![ts, "{}"],
                )
                .unwrap();
        }

        let stats = store.daily_stats().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0], DailyCount { date: today, count: 1 });
        assert_eq!(
            stats[1],
            DailyCount {
                date: yesterday,
                count: 2
            }
        );
    }

    #[test]
    fn records_outside_the_window_are_excluded() {
        let store = WebhookStore::open_in_memory().unwrap();
        store
            .connection()
            .execute(
                "INSERT INTO webhooks (timestamp, data) VALUES (?1, ?2)",
                params!["2020-06-01T00:00:00+00:00", "{}"],
            )
            .unwrap();
        store
            .append(&normalize(&json!({"rule": {"level": 3}})))
            .unwrap();

        let stats = store.daily_stats().unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].count, 1);
    }

    #[test]
    fn empty_log_yields_no_buckets() {
        let store = WebhookStore::open_in_memory().unwrap();
        assert!(store.daily_stats().unwrap().is_empty());
    }
}
