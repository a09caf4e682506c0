// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB v2 HTTP client.
//!
//! Writes batches to `/api/v2/write` with token authentication and maps
//! HTTP outcomes onto the engine's [`SinkError`] taxonomy:
//!
//! - 2xx: accepted, all points written
//! - 400 / 422: the server rejected the payload, [`SinkError::Rejected`]
//! - connect/timeout and other status codes: [`SinkError::Transport`]

use std::time::Duration;

use async_trait::async_trait;
use fluxgen::batch::Batch;
use fluxgen::sink::{PointSink, SinkError};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::line::encode_batch;

/// Errors raised while constructing the client.
#[derive(Debug, Error)]
pub enum InfluxError {
    #[error("invalid influx url: {0}")]
    InvalidUrl(String),

    #[error("http client build failed: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Connection settings for an InfluxDB v2 endpoint.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base URL, e.g. `http://localhost:8086`.
    pub url: String,
    /// Organization name.
    pub org: String,
    /// Target bucket.
    pub bucket: String,
    /// API token.
    pub token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// InfluxDB v2 write client.
///
/// Stateless per call; share one instance across streams behind an
/// `Arc<dyn PointSink>`. The inner `reqwest::Client` pools connections.
#[derive(Debug, Clone)]
pub struct InfluxClient {
    client: Client,
    write_url: String,
    health_url: String,
    token: String,
}

impl InfluxClient {
    /// Build a client from connection settings.
    pub fn new(config: &InfluxConfig) -> Result<Self, InfluxError> {
        let base = config.url.trim_end_matches('/');
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(InfluxError::InvalidUrl(config.url.clone()));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        let write_url = format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ns",
            base,
            urlencode(&config.org),
            urlencode(&config.bucket)
        );
        let health_url = format!("{}/health", base);

        Ok(Self {
            client,
            write_url,
            health_url,
            token: config.token.clone(),
        })
    }

    /// Probe the server's `/health` endpoint.
    ///
    /// Used once at startup; an unreachable server fails the process before
    /// any stream starts.
    pub async fn health(&self) -> Result<(), SinkError> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(classify_request_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Transport {
                detail: format!("health check returned {}", response.status()),
            })
        }
    }
}

#[async_trait]
impl PointSink for InfluxClient {
    async fn write(&self, batch: &Batch) -> Result<usize, SinkError> {
        let body = encode_batch(batch);

        let response = self
            .client
            .post(&self.write_url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(sequence = batch.sequence, points = batch.len(), "batch written");
            return Ok(batch.len());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(classify_status(status, detail))
    }
}

/// Map a transport-level `reqwest` error onto the sink taxonomy.
fn classify_request_error(err: reqwest::Error) -> SinkError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        SinkError::Transport {
            detail: err.to_string(),
        }
    } else {
        SinkError::Unknown {
            detail: err.to_string(),
        }
    }
}

/// Map a non-2xx HTTP status onto the sink taxonomy.
///
/// 400 (malformed line protocol) and 422 (semantically unprocessable points)
/// mean the payload itself was refused; everything else is treated as a
/// transport-level condition that may clear by the next cycle.
fn classify_status(status: StatusCode, detail: String) -> SinkError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => SinkError::Rejected {
            detail: format!("{}: {}", status, detail),
        },
        _ => SinkError::Transport {
            detail: format!("{}: {}", status, detail),
        },
    }
}

/// Percent-encode the characters that matter in a query value.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => out.push(c),
            ' ' => out.push_str("%20"),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> InfluxConfig {
        InfluxConfig {
            url: "http://localhost:8086".to_string(),
            org: "factory".to_string(),
            bucket: "telemetry".to_string(),
            token: "secret".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_write_url_construction() {
        let client = InfluxClient::new(&test_config()).unwrap();
        assert_eq!(
            client.write_url,
            "http://localhost:8086/api/v2/write?org=factory&bucket=telemetry&precision=ns"
        );
        assert_eq!(client.health_url, "http://localhost:8086/health");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let mut config = test_config();
        config.url = "http://localhost:8086/".to_string();
        let client = InfluxClient::new(&config).unwrap();
        assert!(client.write_url.starts_with("http://localhost:8086/api"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = test_config();
        config.url = "localhost:8086".to_string();
        assert!(matches!(
            InfluxClient::new(&config),
            Err(InfluxError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_org_and_bucket_encoded() {
        let mut config = test_config();
        config.org = "my org".to_string();
        config.bucket = "a/b".to_string();
        let client = InfluxClient::new(&config).unwrap();
        assert!(client.write_url.contains("org=my%20org"));
        assert!(client.write_url.contains("bucket=a%2Fb"));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST, String::new()),
            SinkError::Rejected { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, String::new()),
            SinkError::Rejected { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, String::new()),
            SinkError::Transport { .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            SinkError::Transport { .. }
        ));
    }
}
