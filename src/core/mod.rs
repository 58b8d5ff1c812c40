pub mod error;
pub mod hub;
pub mod overflow;
pub mod subscriber;

pub use error::HubError;
pub use hub::{Hub, PublishReport, WILDCARD};
pub use overflow::Overflow;
pub use subscriber::{HandleId, Inbox, Payload, SubscriberHandle};
