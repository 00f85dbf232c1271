//! Daemon core - tick loop, recovery policy and the loop controller
//!
//! The daemon is the long-running process that:
//! - Runs a fixed tick: clock sync if due, fetch, render, metrics if due
//! - Classifies failures and resets the radio or the whole device
//! - Keeps the last good record on the panel through failures

pub mod controller;
pub mod recovery;
pub mod tick;

pub use controller::*;
pub use recovery::*;
pub use tick::*;
