//! The canonical normalized alert record.
//!
//! Inbound webhook payloads arrive in several shapes (raw alert objects,
//! `_source`-wrapped search hits, `alert`-wrapped envelopes). The normalizer
//! in `vigil-ingest` maps all of them onto [`Alert`], which is the only
//! shape the store, the hub, and connected viewers ever see.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity band derived from the rule level.
///
/// Variants are ordered least to most severe so that `Ord` gives a useful
/// sort key for severity-ordered views.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map a rule level onto its severity band.
    ///
    /// Thresholds: >= 12 critical, >= 8 high, >= 5 medium, >= 3 low,
    /// everything below is info. The bands partition the whole level range.
    pub fn from_level(level: u32) -> Self {
        if level >= 12 {
            Severity::Critical
        } else if level >= 8 {
            Severity::High
        } else if level >= 5 {
            Severity::Medium
        } else if level >= 3 {
            Severity::Low
        } else {
            Severity::Info
        }
    }

    /// Parse the lowercase wire form. Returns `None` for unknown strings
    /// so callers can fall back to computing from the rule level.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Severity::Critical),
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            "info" => Some(Severity::Info),
            _ => None,
        }
    }

    /// The lowercase wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

/// Coarse alert category derived from the payload contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    FileIntegrity,
    Authentication,
    WebAttack,
    Network,
    Malware,
    General,
}

impl AlertType {
    /// The snake_case wire form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::FileIntegrity => "file_integrity",
            AlertType::Authentication => "authentication",
            AlertType::WebAttack => "web_attack",
            AlertType::Network => "network",
            AlertType::Malware => "malware",
            AlertType::General => "general",
        }
    }
}

/// Triage status of an alert. The server records the initial value; status
/// transitions happen in viewers and are not ordered -- any status may
/// follow any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    New,
    Acknowledged,
    Investigating,
    Resolved,
}

impl AlertStatus {
    /// Parse the lowercase wire form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(AlertStatus::New),
            "acknowledged" => Some(AlertStatus::Acknowledged),
            "investigating" => Some(AlertStatus::Investigating),
            "resolved" => Some(AlertStatus::Resolved),
            _ => None,
        }
    }
}

/// MITRE ATT&CK references attached to a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mitre {
    #[serde(default)]
    pub id: Vec<String>,
    #[serde(default)]
    pub tactic: Vec<String>,
    #[serde(default)]
    pub technique: Vec<String>,
}

/// The rule that produced an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identifier; inbound payloads carry both numeric and string ids,
    /// the normalizer coerces to string.
    pub id: String,
    /// Rule level, the input to severity classification.
    pub level: u32,
    pub description: String,
    /// Ordered group memberships, the input to alert-type classification.
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitre: Option<Mitre>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pci_dss: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nist_800_53: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gdpr: Vec<String>,
}

/// The endpoint that reported an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingAgent {
    pub id: String,
    pub name: String,
    pub ip: String,
}

impl ReportingAgent {
    /// Sentinel values used when the payload names no agent.
    pub fn unknown() -> Self {
        Self {
            id: "000".to_string(),
            name: "Unknown Agent".to_string(),
            ip: "Unknown IP".to_string(),
        }
    }
}

/// The decoder that parsed the original log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoder {
    pub name: String,
}

/// Structured sub-fields extracted from the payload, plus the unwrapped
/// source body preserved verbatim for viewer-side rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syscheck: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<Value>,
    /// The unwrapped payload body, untouched.
    #[serde(rename = "_source", default)]
    pub source: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srcip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitre_technique: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitre_tactic: Option<String>,
}

/// The canonical alert record.
///
/// Immutable after normalization except for `status`, which viewers mutate
/// locally. `id` is stable across redelivery of the same logical event,
/// which is what makes client-side dedup work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    /// ISO-8601; source-provided or stamped at normalization time.
    pub timestamp: String,
    pub rule: Rule,
    pub agent: ReportingAgent,
    pub location: String,
    pub full_log: String,
    pub decoder: Decoder,
    pub data: AlertData,
    pub severity: Severity,
    #[serde(rename = "alertType")]
    pub alert_type: AlertType,
    pub status: AlertStatus,
}
