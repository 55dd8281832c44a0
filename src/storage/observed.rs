//! Store wrapper that turns successful operations into notifications.

use std::sync::Arc;

use super::point::Point;
use super::query::QueryResult;
use super::{StoreError, TimeSeriesStore};
use crate::flow::{Notification, NotificationRegistry};
use crate::observability::metrics::record_point_written;

/// Pairs a store with the notification registry.
///
/// Notifications are published only after the underlying operation
/// succeeded; failures go back to the caller and nothing is published.
#[derive(Clone)]
pub struct ObservedStore {
    store: Arc<dyn TimeSeriesStore>,
    registry: NotificationRegistry,
}

impl ObservedStore {
    pub fn new(store: Arc<dyn TimeSeriesStore>, registry: NotificationRegistry) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &NotificationRegistry {
        &self.registry
    }

    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.store.initialize().await
    }

    /// Write a point, then publish a WRITE notification carrying its line.
    pub async fn add_point(&self, point: Point) -> Result<(), StoreError> {
        self.store.write(&point).await?;
        record_point_written(point.measurement());

        let delivered = self.registry.publish_all(Notification::write(&point));
        tracing::debug!(measurement = point.measurement(), delivered, "Point written");
        Ok(())
    }

    /// Execute a query command, then publish a QUERY notification with its text.
    pub async fn exec(&self, command: &str) -> Result<Vec<QueryResult>, StoreError> {
        let results = self.store.execute(command).await?;

        let delivered = self.registry.publish_all(Notification::query(command));
        tracing::debug!(command, delivered, "Query executed");
        Ok(results)
    }
}
