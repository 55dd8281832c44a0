//! Stream sessions: one peer connection bound to one subscriber queue.
//!
//! A session waits on two sources at once: the next queued notification,
//! and the liveness detector's disconnect signal. It ends on whichever of
//! peer disconnect, failed write or closed queue comes first, and on the
//! way out it always unregisters its queue and closes the peer.

pub mod liveness;

pub use liveness::{LivenessDetector, PeerGone};

use futures::{Sink, SinkExt, Stream};
use std::fmt;

use crate::flow::{NotificationRegistry, QueueReceiver, SubscriberId, Subscription};
use crate::observability::metrics::{record_session_closed, record_session_opened};

/// Why a session terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The liveness detector reported the peer gone.
    PeerGone(PeerGone),
    /// Writing a notification to the peer failed.
    WriteFailed(String),
    /// The subscription was removed out from under the session.
    Unsubscribed,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::PeerGone(gone) => write!(f, "{gone}"),
            SessionEnd::WriteFailed(e) => write!(f, "write to peer failed: {e}"),
            SessionEnd::Unsubscribed => f.write_str("subscription removed"),
        }
    }
}

/// A live notification stream to one peer.
///
/// `Si` is the outbound half of the connection and receives serialized
/// notification frames.
pub struct StreamSession<Si> {
    peer: Si,
    queue: QueueReceiver,
    subscription: Subscription,
    liveness: LivenessDetector,
}

impl<Si> StreamSession<Si>
where
    Si: Sink<String> + Unpin,
    Si::Error: fmt::Display,
{
    /// Subscribe to `registry` and start watching `inbound` for disconnects.
    pub fn open<S, T, E>(registry: &NotificationRegistry, peer: Si, inbound: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Unpin + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let (queue, subscription) = registry.subscribe();
        let liveness = LivenessDetector::spawn(inbound);
        Self::new(peer, queue, subscription, liveness)
    }

    /// Assemble a session from already created parts.
    pub fn new(
        peer: Si,
        queue: QueueReceiver,
        subscription: Subscription,
        liveness: LivenessDetector,
    ) -> Self {
        Self {
            peer,
            queue,
            subscription,
            liveness,
        }
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscription.id()
    }

    /// Forward notifications until the session ends, then tear it down.
    pub async fn run(mut self) -> SessionEnd {
        let id = self.subscription.id();
        record_session_opened();
        tracing::info!(subscriber = %id, "Stream session started");

        let end = loop {
            tokio::select! {
                // Disconnect wins over pending data.
                biased;

                gone = self.liveness.disconnected() => break SessionEnd::PeerGone(gone),

                next = self.queue.receive() => {
                    let Some(notification) = next else {
                        break SessionEnd::Unsubscribed;
                    };
                    let frame = match notification.to_wire() {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(subscriber = %id, error = %e, "Failed to serialize notification");
                            continue;
                        }
                    };
                    if let Err(e) = self.peer.send(frame).await {
                        break SessionEnd::WriteFailed(e.to_string());
                    }
                }
            }
        };

        self.terminate(&end).await;
        end
    }

    async fn terminate(self, end: &SessionEnd) {
        let Self {
            mut peer,
            queue,
            subscription,
            liveness,
        } = self;

        subscription.unsubscribe();
        drop(liveness);
        drop(queue);

        if let Err(e) = peer.close().await {
            tracing::trace!(subscriber = %subscription.id(), error = %e, "Closing peer failed");
        }

        record_session_closed();
        tracing::info!(subscriber = %subscription.id(), reason = %end, "Stream session ended");
    }
}
