use flume::{Receiver, Sender, TrySendError};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::overflow::Overflow;

/// Message body handed to subscribers. Cloning is a refcount bump, so one
/// publish shares a single allocation across every matching sink.
pub type Payload = Arc<str>;

/// Opaque identity of one subscriber's delivery endpoint.
///
/// Issued fresh for every handle; the nil value marks an unset handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Outcome of handing one message to one sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Delivered after evicting the oldest queued message.
    Evicted,
    /// Discarded because the sink's queue was full.
    Dropped,
    /// The endpoint was torn down while still registered.
    Closed,
}

/// Sending half of a delivery endpoint, as stored by the hub.
#[derive(Debug, Clone)]
pub(crate) struct Sink {
    tx: Sender<Payload>,
    overflow: Overflow,
    // DropOldest needs a receiver of its own to evict from the front.
    evict: Option<Receiver<Payload>>,
}

impl Sink {
    pub(crate) async fn deliver(&self, payload: Payload) -> Delivery {
        match self.overflow {
            Overflow::Block => match self.tx.send_async(payload).await {
                Ok(()) => Delivery::Delivered,
                Err(_) => Delivery::Closed,
            },
            Overflow::DropNewest => match self.tx.try_send(payload) {
                Ok(()) => Delivery::Delivered,
                Err(TrySendError::Full(_)) => Delivery::Dropped,
                Err(TrySendError::Disconnected(_)) => Delivery::Closed,
            },
            Overflow::DropOldest => {
                let mut payload = payload;
                let mut evicted = false;
                loop {
                    match self.tx.try_send(payload) {
                        Ok(()) if evicted => return Delivery::Evicted,
                        Ok(()) => return Delivery::Delivered,
                        Err(TrySendError::Full(back)) => {
                            if let Some(evict) = &self.evict {
                                evicted |= evict.try_recv().is_ok();
                            }
                            payload = back;
                        }
                        Err(TrySendError::Disconnected(_)) => return Delivery::Closed,
                    }
                }
            }
        }
    }
}

/// Handle a collaborator registers with the [`Hub`](crate::core::hub::Hub).
///
/// The collaborator creates the handle together with its [`Inbox`] and keeps
/// both. The hub stores a clone of the sending half for as long as the handle
/// stays registered, so the inbox only reports "closed" once the handle was
/// deregistered *and* every clone the collaborator holds was dropped.
///
/// `SubscriberHandle::default()` is an unset handle: it has no endpoint and
/// registering it fails with [`HubError::InvalidHandle`](crate::core::error::HubError::InvalidHandle).
#[derive(Debug, Clone, Default)]
pub struct SubscriberHandle {
    id: HandleId,
    sink: Option<Sink>,
}

impl SubscriberHandle {
    /// Unbuffered endpoint: every publish waits until the inbox takes the
    /// message.
    pub fn channel() -> (Self, Inbox) {
        let (tx, rx) = flume::bounded(0);
        Self::attach(tx, rx, Overflow::Block)
    }

    /// Endpoint with a queue of `capacity` messages in front of the inbox.
    ///
    /// With [`Overflow::Block`] a full queue still stalls the publisher; the
    /// drop policies never do. A zero capacity is raised to one.
    pub fn bounded(capacity: usize, overflow: Overflow) -> (Self, Inbox) {
        let (tx, rx) = flume::bounded(capacity.max(1));
        Self::attach(tx, rx, overflow)
    }

    fn attach(tx: Sender<Payload>, rx: Receiver<Payload>, overflow: Overflow) -> (Self, Inbox) {
        let evict = matches!(overflow, Overflow::DropOldest).then(|| rx.clone());
        let handle = Self {
            id: HandleId::generate(),
            sink: Some(Sink {
                tx,
                overflow,
                evict,
            }),
        };
        (handle, Inbox { rx })
    }

    #[inline]
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// `false` for the unset handle.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.sink.is_some()
    }

    pub fn overflow(&self) -> Option<Overflow> {
        self.sink.as_ref().map(|sink| sink.overflow)
    }

    pub(crate) fn sink(&self) -> Option<&Sink> {
        self.sink.as_ref()
    }
}

impl PartialEq for SubscriberHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SubscriberHandle {}

impl std::hash::Hash for SubscriberHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Receiving half of a delivery endpoint. Owned by the subscriber.
#[derive(Debug)]
pub struct Inbox {
    rx: Receiver<Payload>,
}

impl Inbox {
    /// Waits for the next message. `None` once the endpoint is closed.
    pub async fn recv(&self) -> Option<Payload> {
        self.rx.recv_async().await.ok()
    }

    /// Takes a message only if one is ready.
    pub fn try_recv(&self) -> Option<Payload> {
        self.rx.try_recv().ok()
    }

    /// Messages currently queued (always zero for unbuffered endpoints).
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
