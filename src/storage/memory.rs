//! In-process store, used by tests and local development.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::point::Point;
use super::query::QueryResult;
use super::{StoreError, TimeSeriesStore};

/// Keeps written points in memory and answers every query with an empty
/// result set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: Mutex<Vec<Point>>,
    commands: Mutex<Vec<String>>,
    initialized: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `message`, or succeed again
    /// with `None`.
    pub fn fail_with(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = message.map(String::from);
    }

    pub fn points(&self) -> Vec<Point> {
        self.points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Commands executed so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        match self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(msg) => Err(StoreError::Backend(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TimeSeriesStore for MemoryStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        self.check()?;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write(&self, point: &Point) -> Result<(), StoreError> {
        self.check()?;
        self.points
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(point.clone());
        Ok(())
    }

    async fn execute(&self, command: &str) -> Result<Vec<QueryResult>, StoreError> {
        self.check()?;
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.to_string());
        Ok(vec![QueryResult {
            statement_id: Some(0),
            ..QueryResult::default()
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FieldValue;
    use std::collections::BTreeMap;

    fn point() -> Point {
        let fields = BTreeMap::from([("v".to_string(), FieldValue::from(1_i64))]);
        Point::new("m", BTreeMap::new(), fields, 0).unwrap()
    }

    #[tokio::test]
    async fn test_records_writes_and_commands() {
        let store = MemoryStore::new();
        store.initialize().await.unwrap();
        store.write(&point()).await.unwrap();
        let results = store.execute("SELECT * FROM m").await.unwrap();

        assert!(store.is_initialized());
        assert_eq!(store.points(), vec![point()]);
        assert_eq!(store.commands(), vec!["SELECT * FROM m".to_string()]);
        assert_eq!(results[0].statement_id, Some(0));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_with(Some("disk full"));

        let err = store.write(&point()).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(ref m) if m == "disk full"));
        assert!(store.points().is_empty());

        store.fail_with(None);
        store.write(&point()).await.unwrap();
        assert_eq!(store.points().len(), 1);
    }
}
