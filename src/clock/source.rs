//! Remote time sources.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Result, TrainsignError};
use crate::net::HttpPool;

/// Something that can report the current local time with a `±HH:MM` suffix.
#[async_trait]
pub trait TimeSource: Send + Sync {
    async fn current_time(&self) -> Result<String>;
}

/// World-time HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTimeSource {
    pool: HttpPool,
    url: String,
}

impl HttpTimeSource {
    pub fn new(pool: HttpPool, url: impl Into<String>) -> Self {
        Self { pool, url: url.into() }
    }
}

#[async_trait]
impl TimeSource for HttpTimeSource {
    async fn current_time(&self) -> Result<String> {
        let response = self.pool.client().get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TrainsignError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let body = response.text().await?;
        extract_datetime(&body)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeResponse {
    Bare(String),
    List(Vec<String>),
    Object { datetime: String },
}

/// Pull the datetime string out of a time service response body.
///
/// Accepts a JSON string, a JSON array whose first element is the string, an
/// object with a `datetime` field, or the bare timestamp as plain text.
pub fn extract_datetime(body: &str) -> Result<String> {
    let body = body.trim();
    match serde_json::from_str::<TimeResponse>(body) {
        Ok(TimeResponse::Bare(s)) | Ok(TimeResponse::Object { datetime: s }) => Ok(s),
        Ok(TimeResponse::List(items)) => items
            .into_iter()
            .next()
            .ok_or_else(|| TrainsignError::parse("time response is an empty array")),
        Err(_) if is_plain_timestamp(body) => Ok(body.to_string()),
        Err(e) => Err(TrainsignError::parse(format!("unrecognised time response: {}", e))),
    }
}

fn is_plain_timestamp(body: &str) -> bool {
    !body.is_empty() && body.starts_with(|c: char| c.is_ascii_digit()) && !body.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bare_json_string() {
        let s = extract_datetime(r#""2026-10-19T08:00:00.123-04:00""#).unwrap();
        assert_eq!(s, "2026-10-19T08:00:00.123-04:00");
    }

    #[test]
    fn test_extract_first_array_element() {
        let s = extract_datetime(r#"["2026-10-19T08:00:00-04:00", "ignored"]"#).unwrap();
        assert_eq!(s, "2026-10-19T08:00:00-04:00");
    }

    #[test]
    fn test_extract_object_datetime() {
        let s = extract_datetime(r#"{"abbreviation":"EDT","datetime":"2026-10-19T08:00:00-04:00"}"#).unwrap();
        assert_eq!(s, "2026-10-19T08:00:00-04:00");
    }

    #[test]
    fn test_extract_plain_text() {
        let s = extract_datetime("2026-10-19T08:00:00+02:30\n").unwrap();
        assert_eq!(s, "2026-10-19T08:00:00+02:30");
    }

    #[test]
    fn test_extract_empty_array_fails() {
        assert!(extract_datetime("[]").is_err());
    }

    #[test]
    fn test_extract_garbage_fails() {
        assert!(extract_datetime("<html>502 Bad Gateway</html>").is_err());
        assert!(extract_datetime("").is_err());
    }
}
