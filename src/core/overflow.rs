use serde::Deserialize;

/// What a subscriber's sink does when a publish finds it unable to take
/// another message right away.
///
/// `Block` is the default contract: the publisher waits for the subscriber,
/// holding the hub's shared lock while it does. The two drop policies are a
/// deliberate deviation for sinks that must never stall the broadcast path;
/// they only make sense with a bounded queue in front of the subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overflow {
    /// Wait until the subscriber accepts the message.
    #[default]
    Block,
    /// Evict the oldest queued message to make room.
    DropOldest,
    /// Discard the message being published.
    DropNewest,
}
