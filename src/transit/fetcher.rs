//! Reduction of raw arrivals to the display record.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime};

use crate::clock::DeviceClock;
use crate::config::TransitConfig;
use crate::domain::{ArrivalRecord, RawArrivalEntry};
use crate::error::{Result, TrainsignError};
use crate::transit::ArrivalSource;

/// Route and threshold settings used to build a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub queens_route: String,
    pub manhattan_route: String,
    /// Arrivals computed below this many minutes are dropped
    pub min_minutes: u32,
}

impl From<&TransitConfig> for FetchSettings {
    fn from(config: &TransitConfig) -> Self {
        Self {
            queens_route: config.queens_route.clone(),
            manhattan_route: config.manhattan_route.clone(),
            min_minutes: config.min_minutes,
        }
    }
}

/// Whole minutes from `now` until `scheduled`, rounded half to even.
///
/// The scheduled time's own offset is discarded: both sides are compared as
/// local wall time.
pub fn minutes_until(now: NaiveDateTime, scheduled: &str) -> Result<i64> {
    let train = DateTime::parse_from_rfc3339(scheduled)
        .map_err(|e| TrainsignError::parse(format!("arrival time '{}': {}", scheduled, e)))?
        .naive_local();
    let millis = (train - now).num_milliseconds();
    Ok((millis as f64 / 60_000.0).round_ties_even() as i64)
}

/// Partition by route, convert to minutes, drop near arrivals, keep two per route.
///
/// Any malformed timestamp fails the whole record.
pub fn build_record(
    entries: &[RawArrivalEntry],
    now: NaiveDateTime,
    settings: &FetchSettings,
) -> Result<ArrivalRecord> {
    let queens = route_minutes(entries, &settings.queens_route, now, settings.min_minutes)?;
    let manhattan = route_minutes(entries, &settings.manhattan_route, now, settings.min_minutes)?;
    Ok(ArrivalRecord::from_minutes(&queens, &manhattan))
}

fn route_minutes(
    entries: &[RawArrivalEntry],
    route: &str,
    now: NaiveDateTime,
    min_minutes: u32,
) -> Result<Vec<u32>> {
    let mut minutes = Vec::new();
    for entry in entries.iter().filter(|e| e.route == route) {
        let m = minutes_until(now, &entry.scheduled_time)?;
        if m >= i64::from(min_minutes) {
            if let Ok(m) = u32::try_from(m) {
                minutes.push(m);
            }
        }
    }
    Ok(minutes)
}

/// Fetches arrivals and turns them into an [`ArrivalRecord`].
pub struct ArrivalFetcher<A: ArrivalSource> {
    source: Arc<A>,
    clock: DeviceClock,
    settings: FetchSettings,
}

impl<A: ArrivalSource> ArrivalFetcher<A> {
    pub fn new(source: Arc<A>, clock: DeviceClock, settings: FetchSettings) -> Self {
        Self { source, clock, settings }
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    /// One request, one complete record. No partial record on failure.
    pub async fn fetch(&self) -> Result<ArrivalRecord> {
        let entries = self.source.arrivals().await?;
        let now = self.clock.now_local();
        log::debug!("Fetched {} arrivals, local time {}", entries.len(), now);
        build_record(&entries, now, &self.settings)
    }
}
