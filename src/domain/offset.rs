//! UTC offset of the device clock.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TrainsignError};

/// Signed seconds of local clock minus UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOffset(i32);

impl TimeOffset {
    pub const UTC: TimeOffset = TimeOffset(0);

    pub fn from_seconds(seconds: i32) -> Self {
        Self(seconds)
    }

    pub fn seconds(&self) -> i32 {
        self.0
    }

    /// Parse a `±HH:MM` suffix.
    ///
    /// Sign, hours and minutes are read independently; anything else is an error.
    pub fn parse_suffix(suffix: &str) -> Result<Self> {
        let bytes = suffix.as_bytes();
        if !suffix.is_ascii() || bytes.len() != 6 || bytes[3] != b':' {
            return Err(TrainsignError::parse(format!("malformed UTC offset '{}'", suffix)));
        }
        let sign = match bytes[0] {
            b'+' => 1,
            b'-' => -1,
            _ => return Err(TrainsignError::parse(format!("UTC offset '{}' has no sign", suffix))),
        };
        let hours = parse_two_digits(&suffix[1..3])?;
        let minutes = parse_two_digits(&suffix[4..6])?;
        if hours > 23 || minutes > 59 {
            return Err(TrainsignError::parse(format!("UTC offset '{}' out of range", suffix)));
        }
        Ok(Self(sign * (hours * 3600 + minutes * 60)))
    }
}

fn parse_two_digits(s: &str) -> Result<i32> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TrainsignError::parse(format!("'{}' is not a number", s)));
    }
    s.parse::<i32>().map_err(|e| TrainsignError::parse(format!("'{}': {}", s, e)))
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { '-' } else { '+' };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
    }
}
