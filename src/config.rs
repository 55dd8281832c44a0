//! Configuration parsing for the anflux server.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::Parser;

use crate::flow::DEFAULT_QUEUE_CAPACITY;
use crate::storage::InfluxConfig;

/// anflux: time-series note ingestion with live WebSocket notification streams.
#[derive(Parser, Debug, Clone)]
#[command(name = "anflux")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind the HTTP server to
    #[arg(long, env = "ANFLUX_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "ANFLUX_PORT", default_value_t = 8888)]
    pub port: u16,

    /// InfluxDB base URL
    #[arg(long, env = "ANFLUX_INFLUX_HOST", default_value = "http://localhost:8086")]
    pub influx_host: String,

    /// InfluxDB username
    #[arg(long, env = "ANFLUX_INFLUX_USERNAME", default_value = "")]
    pub influx_username: String,

    /// InfluxDB password
    #[arg(long, env = "ANFLUX_INFLUX_PASSWORD", default_value = "", hide_env_values = true)]
    pub influx_password: String,

    /// InfluxDB database
    #[arg(long, env = "ANFLUX_INFLUX_DB", default_value = "notes")]
    pub influx_db: String,

    /// Per-stream notification queue capacity; notifications beyond it are dropped
    #[arg(long, env = "ANFLUX_STREAM_QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY,
          value_parser = parse_capacity)]
    pub stream_queue_capacity: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// OpenTelemetry collector endpoint for metrics export (optional)
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,
}

fn parse_capacity(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("capacity must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Address string for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn influx(&self) -> InfluxConfig {
        InfluxConfig {
            host: self.influx_host.clone(),
            username: self.influx_username.clone(),
            password: self.influx_password.clone(),
            database: self.influx_db.clone(),
        }
    }

    /// Create a default configuration for testing.
    pub fn test_config() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0, // Random port
            log_level: "debug".into(),
            stream_queue_capacity: 16,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8888,
            influx_host: "http://localhost:8086".into(),
            influx_username: String::new(),
            influx_password: String::new(),
            influx_db: "notes".into(),
            stream_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_level: "info".into(),
            otel_endpoint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8888);
        assert_eq!(config.influx_db, "notes");
        assert_eq!(config.stream_queue_capacity, 1000);
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::try_parse_from([
            "anflux",
            "--port",
            "9000",
            "--influx-host",
            "http://influx:8086",
            "--influx-db",
            "events",
            "--stream-queue-capacity",
            "5",
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.influx().host, "http://influx:8086");
        assert_eq!(config.influx().database, "events");
        assert_eq!(config.stream_queue_capacity, 5);
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let result = Config::try_parse_from(["anflux", "--stream-queue-capacity", "0"]);
        assert!(result.is_err());
    }
}
