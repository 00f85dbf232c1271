//! Clock synchronization against a remote time source.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;

use crate::clock::{DeviceClock, TimeSource};
use crate::domain::TimeOffset;
use crate::error::{Result, TrainsignError};

const OFFSET_SUFFIX_LEN: usize = 6;

/// Split a `YYYY-MM-DDTHH:MM:SS[.f]±HH:MM` timestamp into local time and offset.
pub fn parse_timestamp(raw: &str) -> Result<(NaiveDateTime, TimeOffset)> {
    let raw = raw.trim();
    if raw.len() <= OFFSET_SUFFIX_LEN || !raw.is_char_boundary(raw.len() - OFFSET_SUFFIX_LEN) {
        return Err(TrainsignError::parse(format!("timestamp '{}' has no UTC offset", raw)));
    }
    let (body, suffix) = raw.split_at(raw.len() - OFFSET_SUFFIX_LEN);
    let offset = TimeOffset::parse_suffix(suffix)?;
    let local = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(body, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| TrainsignError::parse(format!("timestamp '{}': {}", raw, e)))?;
    Ok((local, offset))
}

/// Keeps the device clock in step with a time source.
pub struct ClockSync<S: TimeSource> {
    source: Arc<S>,
    clock: DeviceClock,
}

impl<S: TimeSource> ClockSync<S> {
    pub fn new(source: Arc<S>, clock: DeviceClock) -> Self {
        Self { source, clock }
    }

    pub fn clock(&self) -> &DeviceClock {
        &self.clock
    }

    /// One attempt. On success the device clock and offset are updated.
    pub async fn sync(&self) -> Result<TimeOffset> {
        let raw = self.source.current_time().await?;
        let (local, offset) = parse_timestamp(&raw)?;
        self.clock.set(local, offset);
        log::info!("Clock set to {} (UTC offset {})", local, offset);
        Ok(offset)
    }

    /// Up to `attempts` tries with a fixed `delay` between them. Cold start only.
    pub async fn sync_with_retry(&self, attempts: u32, delay: Duration) -> Result<TimeOffset> {
        let attempts = attempts.max(1);
        let mut last = String::new();
        for attempt in 1..=attempts {
            match self.sync().await {
                Ok(offset) => return Ok(offset),
                Err(e) => {
                    log::warn!("Clock sync attempt {}/{} failed: {}", attempt, attempts, e);
                    last = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        Err(TrainsignError::RetriesExhausted { attempts, last })
    }
}
