//! Best-effort telemetry
//!
//! - line_protocol: InfluxDB line protocol builder
//! - loki: Loki push payload
//! - sinks: HTTP sinks for both
//! - stats: memory and signal readings
//! - emitter: periodic metrics and remote log lines, errors swallowed

pub mod emitter;
pub mod line_protocol;
pub mod loki;
pub mod sinks;
pub mod stats;

pub use emitter::{MEASUREMENT, TelemetryEmitter};
pub use line_protocol::LinePoint;
pub use loki::{LokiPush, LokiStream};
pub use sinks::{InfluxSink, LogSink, LokiSink, MetricsSink};
pub use stats::{DeviceStats, MemoryUsage, ProcStats, parse_meminfo};
