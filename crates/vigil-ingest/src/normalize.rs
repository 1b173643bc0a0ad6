//! Payload-to-Alert normalization.
//!
//! `normalize` is defaulting, never throwing: every field of the canonical
//! record has a defined fallback, and unknown envelope shapes take the flat
//! path rather than being rejected.

use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use vigil_types::{
    Alert, AlertData, AlertStatus, Decoder, Mitre, ReportingAgent, Rule, Severity,
};

use crate::classify;
use crate::identity;

/// Map an arbitrary inbound payload onto the canonical [`Alert`] record.
///
/// The payload may be a search-hit envelope (`{"_source": ...}`), a wrapped
/// form (`{"alert": ...}`), or the alert body itself; one level of known
/// envelope keys is unwrapped, preferring `_source`, then `alert`.
///
/// Severity and alert type are recomputed from the extracted fields, except
/// that an explicitly supplied `severity` or `status` that parses into the
/// enum is honored verbatim.
pub fn normalize(raw: &Value) -> Alert {
    let source = unwrap_envelope(raw);

    if source.get("rule").is_none() {
        debug!("payload carries no rule block, using defaults");
    }

    let rule = extract_rule(source);
    let agent = extract_agent(source);

    let timestamp = source
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    // Payload id, then envelope-level `_id`, then a stable derived id.
    let id = source
        .get("id")
        .and_then(id_string)
        .or_else(|| raw.get("_id").and_then(id_string))
        .unwrap_or_else(|| identity::derive_id(&timestamp, &rule.id, &agent.name));

    let severity = source
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Severity::parse)
        .unwrap_or_else(|| Severity::from_level(rule.level));

    let status = source
        .get("status")
        .and_then(Value::as_str)
        .and_then(AlertStatus::parse)
        .unwrap_or(AlertStatus::New);

    let alert_type = classify::alert_type_of(source, &rule.groups);
    let data = extract_data(source, &rule, &agent);

    Alert {
        id,
        timestamp,
        location: source
            .get("location")
            .and_then(Value::as_str)
            .unwrap_or("Unknown Location")
            .to_string(),
        full_log: source
            .get("full_log")
            .and_then(Value::as_str)
            .or_else(|| source.get("message").and_then(Value::as_str))
            .unwrap_or("No log data available")
            .to_string(),
        decoder: Decoder {
            name: source
                .get("decoder")
                .and_then(|d| d.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        },
        rule,
        agent,
        data,
        severity,
        alert_type,
        status,
    }
}

/// Unwrap one level of known envelope keys, preferring `_source` over
/// `alert`. Anything else is treated as the alert body itself.
fn unwrap_envelope(raw: &Value) -> &Value {
    for key in ["_source", "alert"] {
        if let Some(inner) = raw.get(key) {
            if inner.is_object() {
                return inner;
            }
        }
    }
    raw
}

fn extract_rule(source: &Value) -> Rule {
    let rule = source.get("rule");

    Rule {
        id: rule
            .and_then(|r| r.get("id"))
            .and_then(id_string)
            .unwrap_or_else(|| "Unknown".to_string()),
        level: rule
            .and_then(|r| r.get("level"))
            .and_then(Value::as_u64)
            .map(|l| l as u32)
            .unwrap_or(1),
        description: rule
            .and_then(|r| r.get("description"))
            .and_then(Value::as_str)
            .unwrap_or("Security Alert")
            .to_string(),
        groups: string_list(rule.and_then(|r| r.get("groups"))),
        mitre: rule
            .and_then(|r| r.get("mitre"))
            .cloned()
            .and_then(|m| serde_json::from_value::<Mitre>(m).ok()),
        pci_dss: string_list(rule.and_then(|r| r.get("pci_dss"))),
        nist_800_53: string_list(rule.and_then(|r| r.get("nist_800_53"))),
        gdpr: string_list(rule.and_then(|r| r.get("gdpr"))),
    }
}

fn extract_agent(source: &Value) -> ReportingAgent {
    let agent = source.get("agent");
    let sentinel = ReportingAgent::unknown();

    ReportingAgent {
        id: agent
            .and_then(|a| a.get("id"))
            .and_then(id_string)
            .unwrap_or(sentinel.id),
        name: agent
            .and_then(|a| a.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(sentinel.name),
        ip: agent
            .and_then(|a| a.get("ip"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(sentinel.ip),
    }
}

fn extract_data(source: &Value, rule: &Rule, agent: &ReportingAgent) -> AlertData {
    let syscheck = source.get("syscheck").filter(|v| !v.is_null()).cloned();

    AlertData {
        file_path: syscheck
            .as_ref()
            .and_then(|s| s.get("path"))
            .and_then(Value::as_str)
            .map(str::to_string),
        file_event: syscheck
            .as_ref()
            .and_then(|s| s.get("event"))
            .and_then(Value::as_str)
            .map(str::to_string),
        syscheck,
        manager: source.get("manager").filter(|v| !v.is_null()).cloned(),
        source: source.clone(),
        srcip: extract_srcip(source, agent),
        mitre_technique: rule
            .mitre
            .as_ref()
            .and_then(|m| m.technique.first())
            .cloned(),
        mitre_tactic: rule.mitre.as_ref().and_then(|m| m.tactic.first()).cloned(),
    }
}

/// Source-IP fallback chain: top-level `srcip`/`src_ip`, then the same keys
/// under `data`, then the reporting agent's address.
fn extract_srcip(source: &Value, agent: &ReportingAgent) -> Option<String> {
    let direct = source
        .get("srcip")
        .or_else(|| source.get("src_ip"))
        .and_then(Value::as_str);
    let nested = source
        .get("data")
        .and_then(|d| d.get("srcip").or_else(|| d.get("src_ip")))
        .and_then(Value::as_str);

    direct
        .or(nested)
        .map(str::to_string)
        .or_else(|| {
            if agent.ip == ReportingAgent::unknown().ip {
                None
            } else {
                Some(agent.ip.clone())
            }
        })
}

/// Coerce a string or numeric id to its string form.
fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract an array of strings, skipping non-string members. Missing or
/// malformed arrays yield an empty list.
fn string_list(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
