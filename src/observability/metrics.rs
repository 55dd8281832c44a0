//! OpenTelemetry metrics.
//!
//! Key metrics:
//! - anflux_notifications_published_total: Notifications accepted by subscriber queues
//! - anflux_notifications_dropped_total: Notifications dropped on full queues
//! - anflux_stream_sessions_active: Live stream sessions
//! - anflux_points_written_total: Points written to storage

use opentelemetry::metrics::{Counter, Meter, UpDownCounter};
use opentelemetry::{global, KeyValue};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use std::sync::OnceLock;

/// Global metrics instance, set once by [`init_metrics_with_endpoint`].
static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Instruments recorded by anflux.
#[derive(Debug)]
pub struct Metrics {
    /// Notifications accepted by subscriber queues, by event.
    pub notifications_published: Counter<u64>,
    /// Notifications rejected by full subscriber queues, by event.
    pub notifications_dropped: Counter<u64>,
    /// Stream sessions currently running.
    pub sessions_active: UpDownCounter<i64>,
    /// Points written to storage, by measurement.
    pub points_written: Counter<u64>,
}

impl Metrics {
    /// Create the instruments from a meter.
    fn new(meter: &Meter) -> Self {
        Self {
            notifications_published: meter
                .u64_counter("anflux_notifications_published_total")
                .with_description("Notifications accepted by subscriber queues")
                .with_unit("1")
                .init(),
            notifications_dropped: meter
                .u64_counter("anflux_notifications_dropped_total")
                .with_description("Notifications dropped because a subscriber queue was full")
                .with_unit("1")
                .init(),
            sessions_active: meter
                .i64_up_down_counter("anflux_stream_sessions_active")
                .with_description("Currently running stream sessions")
                .with_unit("1")
                .init(),
            points_written: meter
                .u64_counter("anflux_points_written_total")
                .with_description("Points successfully written to storage")
                .with_unit("1")
                .init(),
        }
    }
}

fn manual_provider() -> SdkMeterProvider {
    let reader = ManualReader::builder().build();
    SdkMeterProvider::builder().with_reader(reader).build()
}

/// Initialize the metrics system, exporting over OTLP when an endpoint is given.
///
/// Subsequent calls are ignored.
pub fn init_metrics_with_endpoint(otel_endpoint: Option<&str>) {
    METRICS.get_or_init(|| {
        if let Some(endpoint) = otel_endpoint {
            use opentelemetry_otlp::{Protocol, WithExportConfig};

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_protocol(Protocol::Grpc);

            match opentelemetry_otlp::new_pipeline()
                .metrics(opentelemetry_sdk::runtime::Tokio)
                .with_exporter(exporter)
                .with_period(std::time::Duration::from_secs(10))
                .build()
            {
                Ok(provider) => {
                    global::set_meter_provider(provider);
                    tracing::info!(endpoint, "OTLP metrics exporter configured");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to create OTLP exporter, using no-op metrics");
                    global::set_meter_provider(manual_provider());
                }
            }
        } else {
            global::set_meter_provider(manual_provider());
        }

        Metrics::new(&global::meter("anflux"))
    });
}

/// Initialize the metrics system without OTLP export.
pub fn init_metrics() {
    init_metrics_with_endpoint(None);
}

/// Record notifications accepted by subscriber queues.
pub fn record_published(event: &'static str, count: u64) {
    if let Some(m) = METRICS.get() {
        m.notifications_published
            .add(count, &[KeyValue::new("event", event)]);
    }
}

/// Record notifications dropped on full subscriber queues.
pub fn record_dropped(event: &'static str, count: u64) {
    if let Some(m) = METRICS.get() {
        m.notifications_dropped
            .add(count, &[KeyValue::new("event", event)]);
    }
}

/// Record a stream session starting.
pub fn record_session_opened() {
    if let Some(m) = METRICS.get() {
        m.sessions_active.add(1, &[]);
    }
}

/// Record a stream session ending.
pub fn record_session_closed() {
    if let Some(m) = METRICS.get() {
        m.sessions_active.add(-1, &[]);
    }
}

/// Record a point written to storage.
pub fn record_point_written(measurement: &str) {
    if let Some(m) = METRICS.get() {
        m.points_written
            .add(1, &[KeyValue::new("measurement", measurement.to_string())]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics();
        init_metrics();
        assert!(METRICS.get().is_some());
    }

    #[test]
    fn test_record_helpers_do_not_panic() {
        init_metrics();
        record_published("POINT", 3);
        record_dropped("QUERY", 1);
        record_session_opened();
        record_session_closed();
        record_point_written("notes");
    }
}
