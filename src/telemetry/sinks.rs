//! HTTP sinks for metrics and log lines.
//!
//! Both use a client with no idle pool so the connection is released as soon
//! as the push finishes, whatever the outcome.

use async_trait::async_trait;

use crate::config::{InfluxConfig, LokiConfig};
use crate::error::{Result, TrainsignError};
use crate::net::HttpPool;
use crate::telemetry::LokiPush;

#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Write one line-protocol line.
    async fn write(&self, line: &str) -> Result<()>;
}

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn push(&self, payload: &LokiPush) -> Result<()>;
}

/// InfluxDB v2 write API.
#[derive(Debug, Clone)]
pub struct InfluxSink {
    pool: HttpPool,
    config: InfluxConfig,
}

impl InfluxSink {
    pub fn new(pool: HttpPool, config: InfluxConfig) -> Self {
        Self { pool, config }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/v2/write", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl MetricsSink for InfluxSink {
    async fn write(&self, line: &str) -> Result<()> {
        let url = self.endpoint();
        let response = self
            .pool
            .oneshot()?
            .post(&url)
            .query(&[("org", self.config.org.as_str()), ("bucket", self.config.bucket.as_str())])
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", self.config.token))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line.to_string())
            .send()
            .await?;
        check_status(response.status(), url)
    }
}

/// Loki push API.
#[derive(Debug, Clone)]
pub struct LokiSink {
    pool: HttpPool,
    url: String,
}

impl LokiSink {
    pub fn new(pool: HttpPool, config: &LokiConfig) -> Self {
        Self {
            pool,
            url: format!("{}/loki/api/v1/push", config.url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LogSink for LokiSink {
    async fn push(&self, payload: &LokiPush) -> Result<()> {
        let response = self.pool.oneshot()?.post(&self.url).json(payload).send().await?;
        check_status(response.status(), self.url.clone())
    }
}

fn check_status(status: reqwest::StatusCode, url: String) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(TrainsignError::Status {
            status: status.as_u16(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn pool() -> HttpPool {
        HttpPool::new(Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_influx_endpoint() {
        let sink = InfluxSink::new(
            pool(),
            InfluxConfig {
                url: "http://influx.local:8086/".to_string(),
                org: "home".to_string(),
                bucket: "sign".to_string(),
                token: "t".to_string(),
            },
        );
        assert_eq!(sink.endpoint(), "http://influx.local:8086/api/v2/write");
    }

    #[test]
    fn test_loki_endpoint() {
        let sink = LokiSink::new(
            pool(),
            &LokiConfig {
                url: "http://loki.local:3100".to_string(),
                labels: Default::default(),
            },
        );
        assert_eq!(sink.endpoint(), "http://loki.local:3100/loki/api/v1/push");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(reqwest::StatusCode::NO_CONTENT, "u".to_string()).is_ok());
        let err = check_status(reqwest::StatusCode::UNAUTHORIZED, "u".to_string()).unwrap_err();
        assert!(matches!(err, TrainsignError::Status { status: 401, .. }));
    }
}
