//! Notification fan-out infrastructure.
//!
//! Provides:
//! - The immutable [`Notification`] value and its wire format
//! - Bounded, drop-newest subscriber queues
//! - The publish/subscribe [`NotificationRegistry`]

pub mod notification;
pub mod queue;
pub mod registry;

pub use notification::{EventKind, Notification};
pub use queue::{Delivery, Notify, QueueReceiver, QueueSender, DEFAULT_QUEUE_CAPACITY};
pub use registry::{NotificationRegistry, SubscriberId, Subscription};
