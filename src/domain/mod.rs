//! Domain types for trainsign
//!
//! - ArrivalRecord: the four display slots derived from one fetch
//! - Slot: minutes until arrival, or the no-data marker
//! - RawArrivalEntry: one upstream arrival before reduction to minutes
//! - TimeOffset: local clock minus UTC, in seconds

pub mod arrival;
pub mod offset;

pub use arrival::{ArrivalRecord, NO_DATA_MARKER, RawArrivalEntry, Slot};
pub use offset::TimeOffset;
