//! Network plumbing shared by every remote call.
//!
//! - HttpPool: the pooled HTTP client, rebuilt to drop every open connection
//! - Radio: control of the wireless interface (reset, reconnect, signal)
//! - ConnectivityProbe: GET against a known-good URL

pub mod pool;
pub mod probe;
pub mod radio;

pub use pool::HttpPool;
pub use probe::{ConnectivityProbe, DEFAULT_PROBE_URL};
pub use radio::{Radio, SystemRadio, parse_wireless_level};
