//! Observability infrastructure.
//!
//! Provides:
//! - Structured tracing via `tracing-subscriber`
//! - OpenTelemetry metrics with optional OTLP export

pub mod metrics;
pub mod tracing;
