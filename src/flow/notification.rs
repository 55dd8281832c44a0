//! Notification value exchanged between producers and stream subscribers.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Kind of storage event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    /// A record was written. Rendered as `POINT` on the wire.
    #[serde(rename = "POINT")]
    Write,
    /// A query command was executed.
    #[serde(rename = "QUERY")]
    Query,
}

impl EventKind {
    /// Wire name of the event.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Write => "POINT",
            EventKind::Query => "QUERY",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable event record fanned out to every live subscriber.
///
/// The payload is shared behind an `Arc` so publishing to many subscribers
/// never copies it. Serializes to `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    #[serde(rename = "event")]
    kind: EventKind,
    #[serde(rename = "data")]
    payload: Arc<str>,
}

impl Notification {
    /// Create a notification from a kind and an already rendered payload.
    pub fn new(kind: EventKind, payload: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Notification for a written record, rendered through its `Display` impl.
    pub fn write(record: &impl fmt::Display) -> Self {
        Self::new(EventKind::Write, record.to_string())
    }

    /// Notification for an executed query command.
    pub fn query(command: impl Into<Arc<str>>) -> Self {
        Self::new(EventKind::Query, command)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Serialize to the JSON text frame sent to stream peers.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_notification_wire_format() {
        let n = Notification::write(&"notes,system=a text=\"hi\" 1");
        let wire: serde_json::Value = serde_json::from_str(&n.to_wire().unwrap()).unwrap();
        assert_eq!(wire["event"], "POINT");
        assert_eq!(wire["data"], "notes,system=a text=\"hi\" 1");
    }

    #[test]
    fn test_query_notification_wire_format() {
        let n = Notification::query("SELECT 1");
        assert_eq!(n.kind(), EventKind::Query);
        assert_eq!(n.to_wire().unwrap(), r#"{"event":"QUERY","data":"SELECT 1"}"#);
    }

    #[test]
    fn test_clones_share_payload() {
        let n = Notification::query("SHOW DATABASES");
        let m = n.clone();
        assert!(Arc::ptr_eq(&n.payload, &m.payload));
    }
}
