//! Filter predicates and sort orders over the alert working set.

use chrono::{DateTime, Utc};

use vigil_types::{Alert, AlertStatus, Severity};

/// A relative time window measured back from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    LastHour,
    Last24Hours,
    Last7Days,
}

impl TimeRange {
    fn max_age_hours(self) -> i64 {
        match self {
            TimeRange::LastHour => 1,
            TimeRange::Last24Hours => 24,
            TimeRange::Last7Days => 168,
        }
    }
}

/// Composable filters over the working set. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AlertFilters {
    pub severity: Option<Severity>,
    pub status: Option<AlertStatus>,
    /// Matches either the agent id or the agent name.
    pub agent: Option<String>,
    pub rule_id: Option<String>,
    /// Case-insensitive substring over description, agent name, location,
    /// and the full log line.
    pub search_text: Option<String>,
    pub time_range: Option<TimeRange>,
}

impl AlertFilters {
    /// Whether the alert passes every configured filter.
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(severity) = self.severity {
            if alert.severity != severity {
                return false;
            }
        }
        if let Some(status) = self.status {
            if alert.status != status {
                return false;
            }
        }
        if let Some(agent) = &self.agent {
            if alert.agent.id != *agent && alert.agent.name != *agent {
                return false;
            }
        }
        if let Some(rule_id) = &self.rule_id {
            if alert.rule.id != *rule_id {
                return false;
            }
        }
        if let Some(text) = &self.search_text {
            let needle = text.to_lowercase();
            let haystack = format!(
                "{} {} {} {}",
                alert.rule.description, alert.agent.name, alert.location, alert.full_log
            )
            .to_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        if let Some(range) = self.time_range {
            // Unparseable timestamps pass rather than silently vanish.
            if let Some(age_hours) = age_in_hours(&alert.timestamp) {
                if age_hours > range.max_age_hours() {
                    return false;
                }
            }
        }
        true
    }
}

/// Hours elapsed since the given RFC-3339 timestamp, or `None` if it does
/// not parse.
pub(crate) fn age_in_hours(timestamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|t| (Utc::now() - t.with_timezone(&Utc)).num_hours())
}

/// Sort keys for ordered views of the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Timestamp,
    Severity,
    RuleLevel,
    AgentName,
}

/// Sort alerts by the given key, descending (the dashboard default).
pub fn sort_alerts(alerts: &mut [Alert], key: SortKey) {
    match key {
        SortKey::Timestamp => alerts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortKey::Severity => alerts.sort_by(|a, b| b.severity.cmp(&a.severity)),
        SortKey::RuleLevel => alerts.sort_by(|a, b| b.rule.level.cmp(&a.rule.level)),
        SortKey::AgentName => alerts.sort_by(|a, b| b.agent.name.cmp(&a.agent.name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_ingest::normalize;

    fn alert(level: u32, agent: &str, description: &str) -> Alert {
        normalize(&json!({
            "timestamp": Utc::now().to_rfc3339(),
            "rule": {"id": "5710", "level": level, "description": description},
            "agent": {"id": "007", "name": agent}
        }))
    }

    #[test]
    fn empty_filters_match_everything() {
        let filters = AlertFilters::default();
        assert!(filters.matches(&alert(3, "web-01", "anything")));
    }

    #[test]
    fn severity_filter() {
        let filters = AlertFilters {
            severity: Some(Severity::Critical),
            ..AlertFilters::default()
        };
        assert!(filters.matches(&alert(13, "web-01", "x")));
        assert!(!filters.matches(&alert(3, "web-01", "x")));
    }

    #[test]
    fn agent_filter_matches_id_or_name() {
        let filters = AlertFilters {
            agent: Some("web-01".to_string()),
            ..AlertFilters::default()
        };
        assert!(filters.matches(&alert(3, "web-01", "x")));

        let by_id = AlertFilters {
            agent: Some("007".to_string()),
            ..AlertFilters::default()
        };
        assert!(by_id.matches(&alert(3, "web-01", "x")));
        assert!(!by_id.matches(&normalize(&json!({"agent": {"id": "008"}}))));
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let filters = AlertFilters {
            search_text: Some("BRUTE force".to_string()),
            ..AlertFilters::default()
        };
        assert!(filters.matches(&alert(8, "db-02", "Brute force attempt")));
        assert!(!filters.matches(&alert(8, "db-02", "Port scan")));
    }

    #[test]
    fn filters_compose() {
        let filters = AlertFilters {
            severity: Some(Severity::High),
            agent: Some("db-02".to_string()),
            search_text: Some("brute".to_string()),
            ..AlertFilters::default()
        };
        assert!(filters.matches(&alert(8, "db-02", "Brute force attempt")));
        // Same text and agent, wrong severity.
        assert!(!filters.matches(&alert(3, "db-02", "Brute force attempt")));
        // Same severity and text, wrong agent.
        assert!(!filters.matches(&alert(8, "web-01", "Brute force attempt")));
    }

    #[test]
    fn time_range_excludes_old_alerts() {
        let filters = AlertFilters {
            time_range: Some(TimeRange::LastHour),
            ..AlertFilters::default()
        };
        let fresh = alert(3, "a", "x");
        assert!(filters.matches(&fresh));

        let stale = normalize(&json!({
            "timestamp": "2020-01-01T00:00:00+00:00",
            "rule": {"level": 3}
        }));
        assert!(!filters.matches(&stale));
    }

    #[test]
    fn unparseable_timestamp_passes_time_filter() {
        let filters = AlertFilters {
            time_range: Some(TimeRange::LastHour),
            ..AlertFilters::default()
        };
        let odd = normalize(&json!({
            "timestamp": "not a timestamp",
            "rule": {"level": 3}
        }));
        assert!(filters.matches(&odd));
    }

    #[test]
    fn severity_sort_puts_critical_first() {
        let mut alerts = vec![
            alert(3, "a", "low"),
            alert(13, "b", "critical"),
            alert(8, "c", "high"),
        ];
        sort_alerts(&mut alerts, SortKey::Severity);
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::High);
        assert_eq!(alerts[2].severity, Severity::Low);
    }
}
