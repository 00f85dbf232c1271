//! Tick bookkeeping - per-tick timing and the loop's mutable state
//!
//! Each tick:
//! - resyncs the clock if the sync interval has elapsed
//! - fetches and renders arrivals
//! - sends metrics if the metrics interval has elapsed

use std::time::{Duration, Instant};

use crate::config::TimingConfig;
use crate::domain::ArrivalRecord;
use crate::error::FailureKind;

/// Intervals that drive the tick loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickConfig {
    /// Sleep between ticks
    pub tick_interval: Duration,
    /// Minimum time between clock syncs
    pub clock_sync_interval: Duration,
    /// Minimum time between metrics pushes
    pub metrics_interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for TickConfig {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            tick_interval: timing.tick_interval(),
            clock_sync_interval: timing.clock_sync_interval(),
            metrics_interval: timing.metrics_interval(),
        }
    }
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock (if due), fetch and render all succeeded
    Success { record: ArrivalRecord, metrics_sent: bool },
    /// A classified failure; soft reset performed
    Failed { kind: FailureKind, error_count: u32 },
    /// Too many consecutive failures; the device must restart
    Restart { error_count: u32 },
}

impl TickOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TickOutcome::Success { .. })
    }
}

/// Mutable loop state, owned by the controller and touched once per tick
#[derive(Debug, Clone)]
pub struct LoopState {
    /// Consecutive failures since the last fully successful tick
    pub error_count: u32,
    /// Failures since process start
    pub total_failures: u64,
    pub last_clock_sync: Option<Instant>,
    pub last_telemetry_send: Option<Instant>,
    start_time: Instant,
}

impl LoopState {
    pub fn new(start_time: Instant) -> Self {
        Self {
            error_count: 0,
            total_failures: 0,
            last_clock_sync: None,
            last_telemetry_send: None,
            start_time,
        }
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn uptime(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }

    pub fn clock_sync_due(&self, now: Instant, interval: Duration) -> bool {
        is_due(self.last_clock_sync, now, interval)
    }

    pub fn telemetry_due(&self, now: Instant, interval: Duration) -> bool {
        is_due(self.last_telemetry_send, now, interval)
    }

    /// Record a fully successful tick
    pub fn record_success(&mut self) {
        self.error_count = 0;
    }

    /// Record a classified failure, returning the new count
    pub fn record_failure(&mut self) -> u32 {
        self.error_count = self.error_count.saturating_add(1);
        self.total_failures += 1;
        self.error_count
    }
}

fn is_due(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    match last {
        None => true,
        Some(last) => now >= last + interval,
    }
}
