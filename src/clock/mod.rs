//! Clock synchronization
//!
//! - DeviceClock: software real-time clock holding local wall time and the UTC offset
//! - TimeSource: where the current time comes from (HTTP world-time endpoint)
//! - ClockSync: one sync attempt, or a bounded retry for cold start

pub mod device;
pub mod source;
pub mod sync;

pub use device::DeviceClock;
pub use source::{HttpTimeSource, TimeSource, extract_datetime};
pub use sync::{ClockSync, parse_timestamp};
