//! Peer disconnect detection.
//!
//! A stream session never reads from its peer on the delivery path, so an
//! abrupt disconnect would go unnoticed until the next write. The detector
//! keeps a read pending on the inbound half for the whole session and fires
//! a single-shot signal on the first error or end of stream.

use futures::{Stream, StreamExt};
use std::fmt;
use tokio::sync::oneshot;
use tokio_util::task::AbortOnDropHandle;

/// Why the peer is considered gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerGone {
    /// The inbound stream ended.
    Closed,
    /// Reading from the peer failed.
    Error(String),
}

impl fmt::Display for PeerGone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerGone::Closed => f.write_str("peer closed the connection"),
            PeerGone::Error(e) => write!(f, "peer read failed: {e}"),
        }
    }
}

/// Background reader that signals once when the peer goes away.
///
/// The reader task is aborted when the detector is dropped.
#[derive(Debug)]
pub struct LivenessDetector {
    signal: oneshot::Receiver<PeerGone>,
    _reader: AbortOnDropHandle<()>,
}

impl LivenessDetector {
    /// Spawn the reader task over the inbound half of a connection.
    ///
    /// Items read are discarded; only errors and end of stream matter.
    pub fn spawn<S, T, E>(mut inbound: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Unpin + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let reader = tokio::spawn(async move {
            let reason = loop {
                match inbound.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => break PeerGone::Error(e.to_string()),
                    None => break PeerGone::Closed,
                }
            };
            tracing::trace!(%reason, "Liveness reader stopped");
            let _ = tx.send(reason);
        });

        Self {
            signal: rx,
            _reader: AbortOnDropHandle::new(reader),
        }
    }

    /// Wait until the peer is gone.
    ///
    /// Resolves at most once; must not be polled again after it completes.
    pub async fn disconnected(&mut self) -> PeerGone {
        // The sender only disappears without sending if the reader panicked.
        (&mut self.signal)
            .await
            .unwrap_or_else(|_| PeerGone::Error("liveness reader stopped".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc;
    use std::time::Duration;
    use tokio::time::timeout;

    type Inbound = mpsc::UnboundedSender<Result<&'static str, String>>;

    fn detector() -> (Inbound, LivenessDetector) {
        let (tx, rx) = mpsc::unbounded();
        (tx, LivenessDetector::spawn(rx))
    }

    #[tokio::test]
    async fn test_signals_on_close() {
        let (tx, mut liveness) = detector();
        drop(tx);

        let gone = timeout(Duration::from_secs(1), liveness.disconnected())
            .await
            .expect("no disconnect signal");
        assert_eq!(gone, PeerGone::Closed);
    }

    #[tokio::test]
    async fn test_signals_on_read_error() {
        let (tx, mut liveness) = detector();
        tx.unbounded_send(Err("connection reset".into())).unwrap();

        let gone = timeout(Duration::from_secs(1), liveness.disconnected())
            .await
            .expect("no disconnect signal");
        assert_eq!(gone, PeerGone::Error("connection reset".into()));
    }

    #[tokio::test]
    async fn test_inbound_messages_are_ignored() {
        let (tx, mut liveness) = detector();
        tx.unbounded_send(Ok("ping")).unwrap();
        tx.unbounded_send(Ok("hello")).unwrap();

        let pending = timeout(Duration::from_millis(50), liveness.disconnected()).await;
        assert!(pending.is_err(), "live peer must not be reported gone");

        drop(tx);
    }

    #[tokio::test]
    async fn test_stops_reading_after_signal() {
        let (tx, mut liveness) = detector();
        tx.unbounded_send(Err("boom".into())).unwrap();
        liveness.disconnected().await;

        // Reader has exited and dropped the inbound half.
        tokio::task::yield_now().await;
        assert!(tx.is_closed());
    }
}
