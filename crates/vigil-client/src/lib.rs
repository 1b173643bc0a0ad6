//! Live-delivery channel client for Vigil.
//!
//! The server side of the push channel is deliberately dumb: it delivers
//! each event at most once per connection and buffers nothing for absent
//! subscribers. This crate implements the collaborator side that turns that
//! into end-to-end at-least-once delivery:
//!
//! - [`LiveChannel`]: WebSocket client state machine with fixed-backoff
//!   reconnect and a reconnect-time history fetch that covers the gap,
//!   deduplicating by alert id.
//! - [`AlertManager`]: the live working set of alerts -- additions, status
//!   mutations, removals, bulk operations, and derived statistics.
//! - [`filter`]: composable filter predicates and sort orders over the
//!   working set.

pub mod channel;
pub mod filter;
pub mod manager;

pub use channel::{ChannelConfig, ChannelEvent, ChannelState, LiveChannel};
pub use filter::{AlertFilters, SortKey, TimeRange};
pub use manager::{AlertManager, WorkingSetStats};
