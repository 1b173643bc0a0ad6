//! Subscriber registry and broadcast hub for Vigil.
//!
//! The hub is the single shared-mutable-state boundary of the core: it
//! tracks every connected live-delivery channel and fans normalized alerts
//! out to all of them. Delivery to one subscriber never blocks or fails
//! delivery to the rest; a subscriber whose channel is full or closed is
//! dropped on the spot.
//!
//! - [`PushEvent`]: the wire envelope pushed to subscribers.
//! - [`SubscriberRegistry`]: register/unregister/broadcast over the
//!   membership set.

pub mod event;
pub mod registry;

pub use event::PushEvent;
pub use registry::{SubscriberHandle, SubscriberRegistry};
