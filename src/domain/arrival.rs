//! Arrival data as shown on the panel.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown in a slot with no qualifying arrival.
pub const NO_DATA_MARKER: &str = "-";

/// One display slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Minutes until the train arrives
    Minutes(u32),
    /// Nothing scheduled far enough out
    NoData,
}

impl Slot {
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Slot::Minutes(m) => Some(*m),
            Slot::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Slot::NoData)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Minutes(m) => write!(f, "{}", m),
            Slot::NoData => f.write_str(NO_DATA_MARKER),
        }
    }
}

/// The four slots the panel displays. Always replaced as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrivalRecord {
    pub queens_first: Slot,
    pub queens_second: Slot,
    pub manhattan_first: Slot,
    pub manhattan_second: Slot,
}

impl ArrivalRecord {
    /// A record with every slot empty, shown before the first fetch.
    pub fn empty() -> Self {
        Self {
            queens_first: Slot::NoData,
            queens_second: Slot::NoData,
            manhattan_first: Slot::NoData,
            manhattan_second: Slot::NoData,
        }
    }

    /// Build a record from the surviving minutes per route, in arrival order.
    ///
    /// Only the first two values of each route are used; missing ones become
    /// [`Slot::NoData`].
    pub fn from_minutes(queens: &[u32], manhattan: &[u32]) -> Self {
        let slot = |values: &[u32], idx: usize| values.get(idx).copied().map(Slot::Minutes).unwrap_or(Slot::NoData);
        Self {
            queens_first: slot(queens, 0),
            queens_second: slot(queens, 1),
            manhattan_first: slot(manhattan, 0),
            manhattan_second: slot(manhattan, 1),
        }
    }

    pub fn queens(&self) -> (Slot, Slot) {
        (self.queens_first, self.queens_second)
    }

    pub fn manhattan(&self) -> (Slot, Slot) {
        (self.manhattan_first, self.manhattan_second)
    }
}

impl Default for ArrivalRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// One arrival as published by the transit service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawArrivalEntry {
    pub route: String,
    #[serde(rename = "time")]
    pub scheduled_time: String,
}

impl RawArrivalEntry {
    pub fn new(route: impl Into<String>, scheduled_time: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            scheduled_time: scheduled_time.into(),
        }
    }
}
