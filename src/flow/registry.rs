//! Publish/subscribe registry for live notification streams.
//!
//! Tracks every registered subscriber by a monotonically assigned id.
//! Membership changes happen under a single mutex; publishing copies the
//! member list under that mutex and pushes outside it, so a slow subscriber
//! never holds up `subscribe` or `unsubscribe` from other tasks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::notification::Notification;
use super::queue::{subscriber_queue, Delivery, Notify, QueueReceiver, DEFAULT_QUEUE_CAPACITY};
use crate::observability::metrics::{record_dropped, record_published};

/// Identity of one registration.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Per-publish tally of subscriber outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct FanOut {
    delivered: usize,
    /// Rejected by a full queue.
    dropped: usize,
    /// Skipped because the consumer already went away.
    closed: usize,
}

type Members = HashMap<SubscriberId, Arc<dyn Notify>>;

struct Inner {
    members: Mutex<Members>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

impl Inner {
    fn members(&self) -> MutexGuard<'_, Members> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: SubscriberId) -> bool {
        self.members().remove(&id).is_some()
    }
}

/// Shared registry of notification subscribers.
///
/// Cloning is cheap; all clones refer to the same member set.
#[derive(Clone)]
pub struct NotificationRegistry {
    inner: Arc<Inner>,
}

impl NotificationRegistry {
    /// Create an empty registry whose queues hold `queue_capacity` entries.
    ///
    /// # Panics
    ///
    /// Panics if `queue_capacity` is zero.
    pub fn new(queue_capacity: usize) -> Self {
        assert!(queue_capacity > 0, "queue capacity must be positive");
        Self {
            inner: Arc::new(Inner {
                members: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                queue_capacity,
            }),
        }
    }

    /// Capacity given to queues created by [`subscribe`](Self::subscribe).
    pub fn queue_capacity(&self) -> usize {
        self.inner.queue_capacity
    }

    /// Register a fresh bounded queue.
    ///
    /// Returns the receive half of the queue and the handle that removes the
    /// registration again.
    pub fn subscribe(&self) -> (QueueReceiver, Subscription) {
        let (tx, rx) = subscriber_queue(self.inner.queue_capacity);
        let subscription = self.subscribe_with(Arc::new(tx));
        (rx, subscription)
    }

    /// Register any [`Notify`] implementation as a subscriber.
    pub fn subscribe_with(&self, subscriber: Arc<dyn Notify>) -> Subscription {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner.members().insert(id, subscriber);
        tracing::debug!(subscriber = %id, "Subscriber registered");

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Offer a notification to every subscriber registered right now.
    ///
    /// Subscribers whose queue is full miss it. Returns how many accepted it.
    pub fn publish_all(&self, notification: Notification) -> usize {
        self.fan_out(notification).delivered
    }

    fn fan_out(&self, notification: Notification) -> FanOut {
        let snapshot: Vec<(SubscriberId, Arc<dyn Notify>)> = self
            .inner
            .members()
            .iter()
            .map(|(id, member)| (*id, Arc::clone(member)))
            .collect();

        let kind = notification.kind();
        let mut outcome = FanOut::default();
        for (id, member) in &snapshot {
            match member.push(notification.clone()) {
                Delivery::Accepted => outcome.delivered += 1,
                Delivery::Full => {
                    outcome.dropped += 1;
                    tracing::debug!(subscriber = %id, event = %kind, "Subscriber queue full, notification dropped");
                }
                Delivery::Closed => outcome.closed += 1,
            }
        }

        record_published(kind.as_str(), outcome.delivered as u64);
        if outcome.dropped > 0 {
            record_dropped(kind.as_str(), outcome.dropped as u64);
        }
        if outcome.closed > 0 {
            tracing::trace!(event = %kind, closed = outcome.closed, "Skipped subscribers already gone");
        }

        outcome
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.members().len()
    }

    /// Whether `id` is currently registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.members().contains_key(&id)
    }
}

impl Default for NotificationRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl std::fmt::Debug for NotificationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRegistry")
            .field("subscribers", &self.subscriber_count())
            .field("queue_capacity", &self.inner.queue_capacity)
            .finish()
    }
}

/// Deregistration capability for one registration.
///
/// Dropping the handle unregisters as well.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    registry: Weak<Inner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the registration.
    ///
    /// Returns `true` only for the call that actually removed it; later calls
    /// are no-ops.
    pub fn unsubscribe(&self) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };
        let removed = inner.remove(self.id);
        if removed {
            tracing::debug!(subscriber = %self.id, "Subscriber unregistered");
        }
        removed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
