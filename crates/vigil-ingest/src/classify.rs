//! Severity and alert-type classification rules.
//!
//! Both classifications are pure functions of the payload: recomputing from
//! identical input always yields the identical result.

use serde_json::Value;
use vigil_types::AlertType;

/// Group keywords that mark an authentication alert.
const AUTHENTICATION_GROUPS: &[&str] = &["authentication"];

/// Group keywords that mark a web attack.
const WEB_GROUPS: &[&str] = &["web"];

/// Group keywords that mark a network alert.
const NETWORK_GROUPS: &[&str] = &["firewall"];

/// Group keywords that mark a malware alert.
const MALWARE_GROUPS: &[&str] = &["malware"];

/// Derive the alert type from the unwrapped payload body.
///
/// A `syscheck` sub-payload always wins, regardless of group membership.
/// After that, the first group-keyword set matched by `groups` decides, in
/// the order authentication, web, firewall, malware.
pub fn alert_type_of(source: &Value, groups: &[String]) -> AlertType {
    if source.get("syscheck").is_some_and(|v| !v.is_null()) {
        return AlertType::FileIntegrity;
    }
    if matches_any(groups, AUTHENTICATION_GROUPS) {
        return AlertType::Authentication;
    }
    if matches_any(groups, WEB_GROUPS) {
        return AlertType::WebAttack;
    }
    if matches_any(groups, NETWORK_GROUPS) {
        return AlertType::Network;
    }
    if matches_any(groups, MALWARE_GROUPS) {
        return AlertType::Malware;
    }
    AlertType::General
}

fn matches_any(groups: &[String], keywords: &[&str]) -> bool {
    groups.iter().any(|g| keywords.contains(&g.as_str()))
}
