//! Software real-time clock.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};

use crate::domain::TimeOffset;

#[derive(Debug)]
struct ClockState {
    /// Local wall time at `anchored_at`
    anchor: NaiveDateTime,
    /// None when the clock is frozen
    anchored_at: Option<Instant>,
    offset: TimeOffset,
    synced: bool,
}

/// The device's local wall clock.
///
/// Holds offset-naive local time plus the offset last reported by the time
/// service. Until the first sync the clock follows the host clock and the
/// offset is zero. Clones share the same clock.
#[derive(Debug, Clone)]
pub struct DeviceClock {
    state: Arc<Mutex<ClockState>>,
}

impl DeviceClock {
    pub fn new() -> Self {
        Self::with_state(Local::now().naive_local(), Some(Instant::now()))
    }

    /// A clock that does not advance on its own. `set` moves it to the new value.
    pub fn frozen(at: NaiveDateTime) -> Self {
        Self::with_state(at, None)
    }

    fn with_state(anchor: NaiveDateTime, anchored_at: Option<Instant>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                anchor,
                anchored_at,
                offset: TimeOffset::default(),
                synced: false,
            })),
        }
    }

    /// Set local wall time and the UTC offset.
    pub fn set(&self, local: NaiveDateTime, offset: TimeOffset) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.anchor = local;
        if state.anchored_at.is_some() {
            state.anchored_at = Some(Instant::now());
        }
        state.offset = offset;
        state.synced = true;
    }

    /// Current local wall time, offset-naive.
    pub fn now_local(&self) -> NaiveDateTime {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.anchored_at {
            Some(at) => state.anchor + TimeDelta::from_std(at.elapsed()).unwrap_or(TimeDelta::zero()),
            None => state.anchor,
        }
    }

    pub fn offset(&self) -> TimeOffset {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).offset
    }

    pub fn is_synced(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).synced
    }

    /// Current UTC time: local wall time minus the stored offset.
    pub fn now_utc(&self) -> DateTime<Utc> {
        let local = self.now_local();
        (local - TimeDelta::seconds(i64::from(self.offset().seconds()))).and_utc()
    }

    /// Current UTC time in nanoseconds since the Unix epoch.
    pub fn utc_nanos(&self) -> i64 {
        let now = self.now_utc();
        now.timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp().saturating_mul(1_000_000_000))
    }
}

impl Default for DeviceClock {
    fn default() -> Self {
        Self::new()
    }
}
