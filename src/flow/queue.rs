//! Bounded per-subscriber delivery queue.
//!
//! The push side never blocks: when the inbox is full the incoming
//! notification is dropped (drop-newest) so a stalled subscriber cannot
//! stall ingestion.

use tokio::sync::mpsc::{self, error::TrySendError};

use super::notification::Notification;

/// Default inbox capacity for stream subscribers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Outcome of offering a notification to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// The inbox was full and the notification was dropped.
    Full,
    /// The consumer is gone; nothing will read this inbox again.
    Closed,
}

impl Delivery {
    pub fn is_accepted(self) -> bool {
        self == Delivery::Accepted
    }
}

/// Anything that can accept a notification without blocking.
///
/// Implemented by [`QueueSender`] and by test collectors.
pub trait Notify: Send + Sync {
    fn push(&self, notification: Notification) -> Delivery;
}

/// Create a bounded queue, returning its push and receive halves.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn subscriber_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { tx, capacity }, QueueReceiver { rx })
}

/// Push half of a subscriber queue, owned by the registry entry.
#[derive(Debug)]
pub struct QueueSender {
    tx: mpsc::Sender<Notification>,
    capacity: usize,
}

impl QueueSender {
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Notify for QueueSender {
    fn push(&self, notification: Notification) -> Delivery {
        match self.tx.try_send(notification) {
            Ok(()) => Delivery::Accepted,
            Err(TrySendError::Full(_)) => Delivery::Full,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Receive half of a subscriber queue, held by the stream session.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Notification>,
}

impl QueueReceiver {
    /// Wait for the next notification.
    ///
    /// Returns `None` once the registry has dropped the push half and the
    /// inbox is drained.
    pub async fn receive(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Take a notification if one is already queued.
    pub fn try_receive(&mut self) -> Option<Notification> {
        self.rx.try_recv().ok()
    }
}
