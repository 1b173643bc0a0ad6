//! Webhook payload normalization for Vigil.
//!
//! Inbound webhooks carry security alerts in several shapes: a raw alert
//! object, a search-hit envelope (`{"_source": ...}`), or a wrapped form
//! (`{"alert": ...}`). This crate maps all of them onto the canonical
//! [`Alert`](vigil_types::Alert) record. It provides:
//!
//! - [`normalize`]: the defaulting, never-failing payload-to-Alert mapping
//! - [`classify`]: severity and alert-type derivation rules
//! - [`identity`]: deterministic alert id derivation for redelivery dedup
//! - [`RecentIds`]: a bounded recent-id set for duplicate suppression

pub mod classify;
pub mod dedup;
pub mod identity;
pub mod normalize;

pub use dedup::RecentIds;
pub use identity::derive_id;
pub use normalize::normalize;
