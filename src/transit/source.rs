//! Transit data source.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::TransitConfig;
use crate::domain::RawArrivalEntry;
use crate::error::{Result, TrainsignError};
use crate::net::HttpPool;

/// Provides the raw arrivals for the configured stop and direction, in source order.
#[async_trait]
pub trait ArrivalSource: Send + Sync {
    async fn arrivals(&self) -> Result<Vec<RawArrivalEntry>>;
}

/// Transit API over HTTP: `GET <base>/by-id/<stop>`.
#[derive(Debug, Clone)]
pub struct HttpArrivalSource {
    pool: HttpPool,
    url: String,
    direction: String,
}

impl HttpArrivalSource {
    pub fn new(pool: HttpPool, config: &TransitConfig) -> Self {
        Self {
            pool,
            url: config.stop_url(),
            direction: config.direction.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ArrivalSource for HttpArrivalSource {
    async fn arrivals(&self) -> Result<Vec<RawArrivalEntry>> {
        // Stale sockets from a previous tick are the usual cause of hung fetches
        self.pool.close_all()?;

        let response = self.pool.client().get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TrainsignError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let body: Value = response.json().await?;
        parse_stop_response(body, &self.direction)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StopResponse {
    Wrapped { data: Vec<Value> },
    Bare(Vec<Value>),
}

/// Extract the arrivals for `direction` from the first stop in the response.
///
/// The body is either an array of stop objects or `{"data": [...]}`.
pub fn parse_stop_response(body: Value, direction: &str) -> Result<Vec<RawArrivalEntry>> {
    let stops = match serde_json::from_value::<StopResponse>(body)
        .map_err(|_| TrainsignError::parse("stop response is not an array of stops"))?
    {
        StopResponse::Wrapped { data } => data,
        StopResponse::Bare(stops) => stops,
    };
    let mut stop = stops
        .into_iter()
        .next()
        .ok_or_else(|| TrainsignError::parse("stop response contains no stops"))?;
    let entries = stop
        .get_mut(direction)
        .map(Value::take)
        .ok_or_else(|| TrainsignError::parse(format!("stop has no '{}' direction", direction)))?;
    Ok(serde_json::from_value(entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_arrivals_closes_pooled_sockets_first() {
        let pool = HttpPool::new(Duration::from_secs(1)).unwrap();
        let config = TransitConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..TransitConfig::default()
        };
        let source = HttpArrivalSource::new(pool.clone(), &config);
        assert_eq!(source.url(), "http://127.0.0.1:9/by-id/F20");

        assert!(source.arrivals().await.is_err());
        assert_eq!(pool.generation(), 1);
        assert!(source.arrivals().await.is_err());
        assert_eq!(pool.generation(), 2);
    }

    #[test]
    fn test_parse_wrapped_response() {
        let body = json!({
            "data": [{
                "name": "7 Av",
                "N": [
                    {"route": "G", "time": "2026-10-19T08:05:00-04:00"},
                    {"route": "F", "time": "2026-10-19T08:07:00-04:00"}
                ],
                "S": [{"route": "F", "time": "2026-10-19T08:06:00-04:00"}]
            }],
            "updated": "2026-10-19T08:00:00-04:00"
        });
        let entries = parse_stop_response(body, "N").unwrap();
        assert_eq!(
            entries,
            vec![
                RawArrivalEntry::new("G", "2026-10-19T08:05:00-04:00"),
                RawArrivalEntry::new("F", "2026-10-19T08:07:00-04:00"),
            ]
        );
    }

    #[test]
    fn test_parse_bare_array_response() {
        let body = json!([{"N": [{"route": "G", "time": "2026-10-19T08:05:00-04:00"}]}]);
        let entries = parse_stop_response(body, "N").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].route, "G");
    }

    #[test]
    fn test_parse_empty_direction() {
        let body = json!([{"N": []}]);
        assert!(parse_stop_response(body, "N").unwrap().is_empty());
    }

    #[test]
    fn test_parse_missing_direction_fails() {
        let body = json!([{"S": []}]);
        assert!(matches!(parse_stop_response(body, "N"), Err(TrainsignError::Parse(_))));
    }

    #[test]
    fn test_parse_no_stops_fails() {
        assert!(parse_stop_response(json!({"data": []}), "N").is_err());
    }

    #[test]
    fn test_parse_wrong_shape_fails() {
        assert!(parse_stop_response(json!({"error": "down"}), "N").is_err());
        assert!(parse_stop_response(json!("nope"), "N").is_err());
    }

    #[test]
    fn test_parse_entry_missing_route_fails() {
        let body = json!([{"N": [{"time": "2026-10-19T08:05:00-04:00"}]}]);
        let err = parse_stop_response(body, "N").unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::Parse);
    }
}
