//! Time-series storage layer.
//!
//! Provides:
//! - The [`TimeSeriesStore`] boundary used by request handlers
//! - An InfluxDB 1.x HTTP implementation and an in-memory one
//! - [`ObservedStore`], which publishes a notification after every
//!   successful write or query

pub mod influx;
pub mod memory;
pub mod observed;
pub mod point;
pub mod query;

pub use influx::{InfluxConfig, InfluxStore};
pub use memory::MemoryStore;
pub use observed::ObservedStore;
pub use point::{FieldValue, Point, PointError, Precision};
pub use query::{QueryResponse, QueryResult, Series};

use async_trait::async_trait;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("storage returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("storage error: {0}")]
    Backend(String),

    #[error("invalid point: {0}")]
    InvalidPoint(#[from] PointError),
}

/// A time-series backend.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Create the target database if needed. Safe to call repeatedly.
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Persist one point.
    async fn write(&self, point: &Point) -> Result<(), StoreError>;

    /// Run a query command and return its per-statement results.
    async fn execute(&self, command: &str) -> Result<Vec<QueryResult>, StoreError>;
}
