//! Connectivity check against a known-good URL.

use crate::error::{Result, TrainsignError};
use crate::net::HttpPool;

pub const DEFAULT_PROBE_URL: &str = "https://httpbin.org/get";

#[derive(Debug, Clone)]
pub struct ConnectivityProbe {
    pool: HttpPool,
    url: String,
}

impl ConnectivityProbe {
    pub fn new(pool: HttpPool, url: impl Into<String>) -> Self {
        Self { pool, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// GET the probe URL; returns the status code on success.
    pub async fn check(&self) -> Result<u16> {
        let response = self.pool.client().get(&self.url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(TrainsignError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            })
        }
    }
}
