//! The broadcaster: subscription registry plus topic-matched fan-out.
//!
//! One reader/writer lock guards the whole handle → topic-set map.
//! `publish` holds it in shared mode for the full duration of its fan-out;
//! `register` and `deregister` take it exclusively.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::core::error::HubError;
use crate::core::subscriber::subscriber::Sink;
use crate::core::subscriber::{Delivery, HandleId, Payload, SubscriberHandle};

/// Topic that matches every publish, whatever topic it names.
pub const WILDCARD: &str = "*";

#[derive(Debug)]
struct Registration {
    sink: Sink,
    // never empty while stored
    topics: HashSet<String>,
}

impl Registration {
    #[inline]
    fn matches(&self, topic: &str) -> bool {
        self.topics.contains(WILDCARD) || self.topics.contains(topic)
    }
}

/// Per-call delivery tally returned by [`Hub::publish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Registrations whose topic set matched.
    pub matched: usize,
    /// Messages a sink accepted.
    pub delivered: usize,
    /// Messages discarded by a sink's overflow policy (new or evicted).
    pub dropped: usize,
    /// Matches whose endpoint had already been torn down.
    pub closed: usize,
}

/// Topic-filtered fan-out hub.
///
/// Build one per process and share it as `Arc<Hub>` with every collaborator
/// that registers sinks or publishes.
#[derive(Debug, Default)]
pub struct Hub {
    registrations: RwLock<HashMap<HandleId, Registration>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for the common `Arc<Hub>` construction.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Subscribes `handle` to `topics`.
    ///
    /// A handle that is already registered keeps its current topics and gains
    /// the new ones. Fails with [`HubError::InvalidHandle`] for an unset handle
    /// and with [`HubError::NoTopics`] for an empty topic list; neither case
    /// touches the registry.
    pub async fn register<I, T>(&self, handle: &SubscriberHandle, topics: I) -> Result<(), HubError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let sink = handle.sink().ok_or(HubError::InvalidHandle)?;

        let topics: HashSet<String> = topics.into_iter().map(Into::into).collect();
        if topics.is_empty() {
            return Err(HubError::NoTopics);
        }

        let mut registrations = self.registrations.write().await;
        let registration = registrations
            .entry(handle.id())
            .or_insert_with(|| Registration {
                sink: sink.clone(),
                topics: HashSet::with_capacity(topics.len()),
            });
        registration.topics.extend(topics);
        let subscribed = registration.topics.len();

        debug!(
            target: "stem::hub",
            handle = %handle.id(),
            topics = subscribed,
            subscribers = registrations.len(),
            "Registered subscriber"
        );
        Ok(())
    }

    /// Drops every subscription of `handle`. Unknown handles are ignored.
    pub async fn deregister(&self, handle: &SubscriberHandle) {
        let mut registrations = self.registrations.write().await;
        if registrations.remove(&handle.id()).is_some() {
            debug!(
                target: "stem::hub",
                handle = %handle.id(),
                subscribers = registrations.len(),
                "Deregistered subscriber"
            );
        }
    }

    /// Delivers `message` to every handle subscribed to `topic` or to
    /// [`WILDCARD`].
    ///
    /// Matching is exact string equality. Deliveries run one after the other,
    /// in no particular order, while the shared lock is held, and the call
    /// returns only once each of them was attempted.
    ///
    /// # Stalls
    ///
    /// Nothing here times out. A blocking sink whose owner stops draining its
    /// inbox holds this call at that delivery indefinitely: subscribers later
    /// in the iteration wait for it, and since the lock stays held so does
    /// every `register`/`deregister` (and, behind a queued writer, every other
    /// publish). Subscribers that cannot promise to drain promptly should use
    /// [`SubscriberHandle::bounded`] with a drop policy instead.
    ///
    /// Publishing into an endpoint that was closed before its handle was
    /// deregistered is a caller bug; it is logged and skipped.
    pub async fn publish(&self, message: impl Into<Payload>, topic: &str) -> PublishReport {
        let payload: Payload = message.into();
        let mut report = PublishReport::default();

        let registrations = self.registrations.read().await;
        for (id, registration) in registrations.iter() {
            if !registration.matches(topic) {
                continue;
            }
            report.matched += 1;

            match registration.sink.deliver(Arc::clone(&payload)).await {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Evicted => {
                    report.delivered += 1;
                    report.dropped += 1;
                }
                Delivery::Dropped => report.dropped += 1,
                Delivery::Closed => {
                    report.closed += 1;
                    warn!(
                        target: "stem::hub",
                        handle = %id,
                        topic,
                        "Endpoint closed before deregistration; message not delivered"
                    );
                }
            }
        }
        drop(registrations);

        debug!(
            target: "stem::hub",
            topic,
            matched = report.matched,
            delivered = report.delivered,
            dropped = report.dropped,
            "Published message"
        );
        report
    }

    /// Number of registered handles.
    pub async fn len(&self) -> usize {
        self.registrations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.registrations.read().await.is_empty()
    }

    pub async fn is_registered(&self, handle: &SubscriberHandle) -> bool {
        self.registrations.read().await.contains_key(&handle.id())
    }

    /// Topics `handle` is subscribed to, sorted. Empty if it is not registered.
    pub async fn topics_of(&self, handle: &SubscriberHandle) -> Vec<String> {
        let registrations = self.registrations.read().await;
        let mut topics: Vec<String> = registrations
            .get(&handle.id())
            .map(|registration| registration.topics.iter().cloned().collect())
            .unwrap_or_default();
        topics.sort_unstable();
        topics
    }
}
