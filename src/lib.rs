//! trainsign - resident control loop for a subway arrival display
//!
//! Every few seconds the loop resyncs the clock when due, fetches arrivals
//! for one stop, hands the record to the panel and pushes telemetry. Failed
//! ticks reset the network; repeated failures restart the device.

pub mod clock;
pub mod config;
pub mod daemon;
pub mod display;
pub mod domain;
pub mod error;
pub mod net;
pub mod telemetry;
pub mod transit;

pub use error::{FailureKind, Result, TrainsignError};
