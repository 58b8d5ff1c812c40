//! Subscriber handles and their delivery endpoints.
//!
//! Provides the opaque `SubscriberHandle` the hub keys registrations by and
//! the `Inbox` its owner drains.

#[allow(clippy::module_inception)]
pub mod subscriber;

pub use subscriber::{Delivery, HandleId, Inbox, Payload, SubscriberHandle};
