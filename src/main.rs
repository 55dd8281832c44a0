//! anflux: time-series note ingestion with live WebSocket notification streams.
//!
//! # Usage
//!
//! ```bash
//! anflux --port 8888 --influx-host http://localhost:8086 --influx-db notes
//! ```
//!
//! Environment variables can also be used:
//! - `ANFLUX_PORT`: Port to listen on
//! - `ANFLUX_INFLUX_HOST`: InfluxDB base URL
//! - `ANFLUX_INFLUX_DB`: InfluxDB database
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use anflux::config::Config;
use anflux::observability::metrics::init_metrics_with_endpoint;
use anflux::observability::tracing::init_tracing;
use anflux::server::run_server;
use tokio::sync::watch;

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  anflux v{} - live time-series notes

  Configuration:
    Address:        {}
    InfluxDB:       {} (db: {})
    Queue capacity: {}
    Log Level:      {}

  Watch the stream at http://{}/watch
  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.bind_addr(),
        config.influx_host,
        config.influx_db,
        config.stream_queue_capacity,
        config.log_level,
        config.bind_addr(),
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    init_tracing(&config.log_level);
    init_metrics_with_endpoint(config.otel_endpoint.as_deref());

    print_banner(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                        }
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating shutdown...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    tracing::info!("Received SIGINT (Ctrl+C), initiating shutdown...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }

        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = run_server(config, shutdown_rx).await {
        tracing::error!(error = %e, "Server failed");
        return Err(e);
    }

    tracing::info!("anflux shutdown complete");
    Ok(())
}
