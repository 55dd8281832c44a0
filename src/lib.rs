//! anflux: time-series note ingestion with live notification streams.
//!
//! Writers post notes that are stored as InfluxDB points; any number of
//! WebSocket clients receive a best-effort live feed of every write and
//! query as it happens.
//!
//! # Architecture
//!
//! - **Fan-out**: an in-process registry pushes each notification into a
//!   bounded queue per subscriber, dropping rather than blocking when full
//! - **Stream sessions**: one task per WebSocket multiplexes queued
//!   notifications against a liveness detector that notices disconnects
//! - **Storage**: InfluxDB 1.x over HTTP behind a small trait
//!
//! # Modules
//!
//! - [`config`]: CLI and environment configuration
//! - [`flow`]: Notifications, subscriber queues and the registry
//! - [`observability`]: Metrics and tracing setup
//! - [`server`]: HTTP server setup
//! - [`service`]: HTTP handlers
//! - [`session`]: Stream sessions and liveness detection
//! - [`storage`]: Time-series storage

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // storage::point::PointError is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod flow;
pub mod observability;
pub mod server;
pub mod service;
pub mod session;
pub mod storage;

/// Get the current Unix timestamp in nanoseconds.
#[must_use]
pub fn now_nanos() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}
