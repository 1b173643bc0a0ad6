//! The live working set of alerts.
//!
//! Holds the newest-first list a dashboard renders, applies status and
//! removal mutations (single and bulk), and computes derived statistics.
//! The working set is capped; the oldest alerts fall off the end.

use std::collections::BTreeMap;

use tracing::debug;

use vigil_types::{Alert, AlertStatus, Severity};

use crate::filter::{age_in_hours, AlertFilters};

/// Default cap on the working set size.
pub const DEFAULT_MAX_ALERTS: usize = 1000;

/// Aggregate statistics over the current working set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSetStats {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    /// Counts keyed by agent name (falling back to agent id).
    pub by_agent: BTreeMap<String, usize>,
    /// Counts keyed by `"<rule id>: <description>"`.
    pub by_rule: BTreeMap<String, usize>,
    pub last_24h: usize,
    pub last_hour: usize,
}

/// The live alert working set, newest first.
#[derive(Debug)]
pub struct AlertManager {
    alerts: Vec<Alert>,
    max_alerts: usize,
}

impl AlertManager {
    /// Create a working set with the default cap.
    pub fn new() -> Self {
        Self::with_max_alerts(DEFAULT_MAX_ALERTS)
    }

    /// Create a working set with an explicit cap.
    pub fn with_max_alerts(max_alerts: usize) -> Self {
        Self {
            alerts: Vec::new(),
            max_alerts: max_alerts.max(1),
        }
    }

    /// Add an alert at the front of the working set.
    ///
    /// Deduplicates by id: re-adding a known alert is a no-op and returns
    /// `false`. When the cap is exceeded the oldest alerts are dropped.
    pub fn add(&mut self, alert: Alert) -> bool {
        if self.alerts.iter().any(|a| a.id == alert.id) {
            debug!(alert_id = %alert.id, "duplicate alert not added");
            return false;
        }
        self.alerts.insert(0, alert);
        self.alerts.truncate(self.max_alerts);
        true
    }

    /// Merge a batch of alerts (e.g. a reconnect-time history fetch) into
    /// the working set, deduplicating by id. Returns the number actually
    /// added. The set is re-ordered newest first afterwards.
    pub fn merge(&mut self, batch: Vec<Alert>) -> usize {
        let mut added = 0;
        for alert in batch {
            if self.add(alert) {
                added += 1;
            }
        }
        if added > 0 {
            self.alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }
        added
    }

    /// Set the status of one alert. Returns `false` if the id is unknown.
    pub fn update_status(&mut self, id: &str, status: AlertStatus) -> bool {
        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.status = status;
                true
            }
            None => false,
        }
    }

    /// Remove one alert. Returns `false` if the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    /// Drop the entire working set.
    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    /// Set the status of every alert named in `ids`. Returns the number
    /// touched.
    pub fn bulk_update_status(&mut self, ids: &[String], status: AlertStatus) -> usize {
        let mut touched = 0;
        for alert in &mut self.alerts {
            if ids.iter().any(|id| *id == alert.id) {
                alert.status = status;
                touched += 1;
            }
        }
        touched
    }

    /// Remove every alert named in `ids`. Returns the number removed.
    pub fn bulk_remove(&mut self, ids: &[String]) -> usize {
        let before = self.alerts.len();
        self.alerts.retain(|a| !ids.iter().any(|id| *id == a.id));
        before - self.alerts.len()
    }

    /// The working set, newest first.
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// The subset passing the given filters, preserving order.
    pub fn filtered(&self, filters: &AlertFilters) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| filters.matches(a)).collect()
    }

    /// Compute aggregate statistics over the working set.
    pub fn stats(&self) -> WorkingSetStats {
        let mut stats = WorkingSetStats {
            total: self.alerts.len(),
            ..WorkingSetStats::default()
        };

        for alert in &self.alerts {
            match alert.severity {
                Severity::Critical => stats.critical += 1,
                Severity::High => stats.high += 1,
                Severity::Medium => stats.medium += 1,
                Severity::Low => stats.low += 1,
                Severity::Info => stats.info += 1,
            }

            let agent_key = if alert.agent.name.is_empty() {
                alert.agent.id.clone()
            } else {
                alert.agent.name.clone()
            };
            *stats.by_agent.entry(agent_key).or_insert(0) += 1;

            let rule_key = format!("{}: {}", alert.rule.id, alert.rule.description);
            *stats.by_rule.entry(rule_key).or_insert(0) += 1;

            if let Some(age) = age_in_hours(&alert.timestamp) {
                if age <= 24 {
                    stats.last_24h += 1;
                }
                if age < 1 {
                    stats.last_hour += 1;
                }
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}
