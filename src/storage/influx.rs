//! InfluxDB 1.x HTTP client.
//!
//! Queries go to `POST /query` and writes to `POST /write` as line protocol
//! with second precision. Errors reported inside a 200 response body are
//! surfaced the same way as HTTP-level failures.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::point::{Point, Precision};
use super::query::{QueryResponse, QueryResult};
use super::{StoreError, TimeSeriesStore};

/// Precision used for writes.
const WRITE_PRECISION: Precision = Precision::Seconds;

/// Connection settings for an InfluxDB server.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://localhost:8086`
    pub host: String,
    pub username: String,
    pub password: String,
    pub database: String,
}

/// [`TimeSeriesStore`] backed by an InfluxDB server.
#[derive(Debug, Clone)]
pub struct InfluxStore {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    database: String,
}

impl InfluxStore {
    /// Create a client. No connection is made until the first request.
    pub fn new(config: InfluxConfig) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            username: config.username,
            password: config.password,
            database: config.database,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Command that bootstraps the configured database.
    pub fn create_database_command(&self) -> String {
        format!("CREATE DATABASE {}", quote_ident(&self.database))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        if self.username.is_empty() {
            req
        } else {
            req.basic_auth(&self.username, Some(&self.password))
        }
    }

    async fn error_from(resp: Response) -> StoreError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<QueryResponse>(&body) {
            Ok(parsed) => match parsed.first_error() {
                Some(msg) => StoreError::Backend(msg.to_string()),
                None => StoreError::Status { status, body },
            },
            Err(_) => StoreError::Status { status, body },
        }
    }
}

#[async_trait]
impl TimeSeriesStore for InfluxStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        let command = self.create_database_command();
        tracing::info!(database = %self.database, "Initializing database");
        self.execute(&command).await.map(|_| ())
    }

    #[tracing::instrument(skip(self, point), fields(measurement = point.measurement()))]
    async fn write(&self, point: &Point) -> Result<(), StoreError> {
        let url = format!("{}/write", self.base_url);
        let req = self
            .client
            .post(url)
            .query(&[
                ("db", self.database.as_str()),
                ("precision", WRITE_PRECISION.as_param()),
            ])
            .body(point.line(WRITE_PRECISION));

        let resp = self.authorize(req).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn execute(&self, command: &str) -> Result<Vec<QueryResult>, StoreError> {
        let url = format!("{}/query", self.base_url);
        let req = self
            .client
            .post(url)
            .query(&[("db", self.database.as_str()), ("q", command)]);

        let resp = self.authorize(req).send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let parsed: QueryResponse = resp.json().await?;
        if let Some(msg) = parsed.first_error() {
            return Err(StoreError::Backend(msg.to_string()));
        }
        Ok(parsed.results)
    }
}

/// Quote an InfluxQL identifier.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('\\', "\\\\").replace('"', "\\\""))
}
