//! Periodic metrics and remote log lines.
//!
//! Every operation here swallows its own errors: telemetry never reaches the
//! recovery policy and never changes the error count.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use log::Level;

use crate::clock::DeviceClock;
use crate::config::TelemetryConfig;
use crate::net::HttpPool;
use crate::telemetry::{DeviceStats, InfluxSink, LinePoint, LogSink, LokiPush, LokiSink, MemoryUsage, MetricsSink};

/// Measurement name for metrics lines.
pub const MEASUREMENT: &str = "trainsign";

pub struct TelemetryEmitter {
    host: String,
    clock: DeviceClock,
    stats: Arc<dyn DeviceStats>,
    metrics: Option<Arc<dyn MetricsSink>>,
    logs: Option<Arc<dyn LogSink>>,
    labels: BTreeMap<String, String>,
}

impl TelemetryEmitter {
    /// An emitter with no sinks; both operations are no-ops until sinks are attached.
    pub fn new(host: impl Into<String>, clock: DeviceClock, stats: Arc<dyn DeviceStats>) -> Self {
        Self {
            host: host.into(),
            clock,
            stats,
            metrics: None,
            logs: None,
            labels: BTreeMap::new(),
        }
    }

    /// Build the emitter with whichever sinks are configured.
    pub fn from_config(
        config: &TelemetryConfig,
        host: impl Into<String>,
        pool: &HttpPool,
        clock: DeviceClock,
        stats: Arc<dyn DeviceStats>,
    ) -> Self {
        let mut emitter = Self::new(host, clock, stats);
        if let Some(influx) = &config.influx {
            emitter = emitter.with_metrics_sink(Arc::new(InfluxSink::new(pool.clone(), influx.clone())));
        }
        if let Some(loki) = &config.loki {
            emitter = emitter.with_log_sink(Arc::new(LokiSink::new(pool.clone(), loki)), loki.labels.clone());
        }
        emitter
    }

    pub fn with_metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>, labels: BTreeMap<String, String>) -> Self {
        self.logs = Some(sink);
        self.labels = labels;
        self
    }

    pub fn has_metrics_sink(&self) -> bool {
        self.metrics.is_some()
    }

    pub fn has_log_sink(&self) -> bool {
        self.logs.is_some()
    }

    /// Push one metrics line. Returns whether the push succeeded.
    pub async fn emit_metrics(&self, uptime: Duration, error_count: u64) -> bool {
        let Some(sink) = &self.metrics else {
            return false;
        };
        let memory = self.stats.memory().await;
        let rssi = self.stats.signal_strength().await;
        let line = self.metrics_line(uptime, error_count, memory, rssi);
        match sink.write(&line).await {
            Ok(()) => {
                log::debug!("Metrics sent: {}", line);
                true
            }
            Err(e) => {
                log::warn!("Metrics push failed: {}", e);
                false
            }
        }
    }

    /// Push one log line. Returns whether the push succeeded.
    pub async fn emit_log(&self, level: Level, message: &str) -> bool {
        let Some(sink) = &self.logs else {
            return false;
        };
        let payload = self.log_payload(level, message);
        match sink.push(&payload).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Log push failed: {}", e);
                false
            }
        }
    }

    pub fn metrics_line(
        &self,
        uptime: Duration,
        error_count: u64,
        memory: Option<MemoryUsage>,
        rssi: Option<i32>,
    ) -> String {
        let to_i64 = |v: u64| i64::try_from(v).unwrap_or(i64::MAX);
        LinePoint::new(MEASUREMENT)
            .tag("host", &self.host)
            .int("uptime", to_i64(uptime.as_secs()))
            .int("errors", to_i64(error_count))
            .int_opt("mem_free", memory.map(|m| to_i64(m.free)))
            .int_opt("mem_used", memory.map(|m| to_i64(m.used)))
            .int_opt("rssi", rssi.map(i64::from))
            .to_line()
    }

    /// Loki payload stamped with UTC nanoseconds from the device clock.
    pub fn log_payload(&self, level: Level, message: &str) -> LokiPush {
        let mut labels = self.labels.clone();
        labels.insert("host".to_string(), self.host.clone());
        labels.insert("level".to_string(), level.as_str().to_lowercase());
        LokiPush::single(labels, self.clock.utc_nanos(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeOffset;
    use crate::error::{Result, TrainsignError};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    struct FixedStats;

    #[async_trait]
    impl DeviceStats for FixedStats {
        async fn memory(&self) -> Option<MemoryUsage> {
            Some(MemoryUsage { free: 2048, used: 1024 })
        }
        async fn signal_strength(&self) -> Option<i32> {
            Some(-58)
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Mutex<Vec<String>>,
        pushes: Mutex<Vec<LokiPush>>,
        fail: bool,
    }

    #[async_trait]
    impl MetricsSink for RecordingSink {
        async fn write(&self, line: &str) -> Result<()> {
            if self.fail {
                return Err(TrainsignError::Status {
                    status: 500,
                    url: "influx".to_string(),
                });
            }
            self.lines.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl LogSink for RecordingSink {
        async fn push(&self, payload: &LokiPush) -> Result<()> {
            if self.fail {
                return Err(TrainsignError::parse("loki down"));
            }
            self.pushes.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    fn clock() -> DeviceClock {
        let at = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(8, 0, 0).unwrap();
        let clock = DeviceClock::frozen(at);
        clock.set(at, TimeOffset::from_seconds(-14400));
        clock
    }

    fn emitter() -> TelemetryEmitter {
        TelemetryEmitter::new("sign", clock(), Arc::new(FixedStats))
    }

    #[tokio::test]
    async fn test_unconfigured_is_noop() {
        let emitter = emitter();
        assert!(!emitter.has_metrics_sink());
        assert!(!emitter.emit_metrics(Duration::from_secs(5), 0).await);
        assert!(!emitter.emit_log(Level::Info, "hello").await);
    }

    #[tokio::test]
    async fn test_emit_metrics_line() {
        let sink = Arc::new(RecordingSink::default());
        let emitter = emitter().with_metrics_sink(sink.clone());

        assert!(emitter.emit_metrics(Duration::from_secs(125), 2).await);
        let lines = sink.lines.lock().unwrap();
        assert_eq!(
            lines.as_slice(),
            ["trainsign,host=sign uptime=125i,errors=2i,mem_free=2048i,mem_used=1024i,rssi=-58i"]
        );
    }

    #[tokio::test]
    async fn test_emit_metrics_failure_is_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let emitter = emitter().with_metrics_sink(sink);
        assert!(!emitter.emit_metrics(Duration::from_secs(1), 0).await);
    }

    #[tokio::test]
    async fn test_emit_log_payload() {
        let sink = Arc::new(RecordingSink::default());
        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), "trainsign".to_string());
        let emitter = emitter().with_log_sink(sink.clone(), labels);

        assert!(emitter.emit_log(Level::Warn, "fetch failed:\nreset").await);
        let pushes = sink.pushes.lock().unwrap();
        let stream = &pushes[0].streams[0];
        assert_eq!(stream.stream["host"], "sign");
        assert_eq!(stream.stream["level"], "warn");
        assert_eq!(stream.stream["app"], "trainsign");
        // 08:00 local at -04:00 is 12:00 UTC
        let expected = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_nanos_opt()
            .unwrap();
        assert_eq!(stream.values[0][0], expected.to_string());
        assert_eq!(stream.values[0][1], "fetch failed:\nreset");
    }

    #[tokio::test]
    async fn test_emit_log_failure_is_swallowed() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let emitter = emitter().with_log_sink(sink, BTreeMap::new());
        assert!(!emitter.emit_log(Level::Error, "x").await);
    }

    #[test]
    fn test_metrics_line_omits_missing_readings() {
        let line = emitter().metrics_line(Duration::from_secs(3), 0, None, None);
        assert_eq!(line, "trainsign,host=sign uptime=3i,errors=0i");
    }

    #[test]
    fn test_from_config_without_sinks() {
        let pool = HttpPool::new(Duration::from_secs(1)).unwrap();
        let emitter =
            TelemetryEmitter::from_config(&TelemetryConfig::default(), "sign", &pool, clock(), Arc::new(FixedStats));
        assert!(!emitter.has_metrics_sink());
        assert!(!emitter.has_log_sink());
    }
}
