//! Device health readings for metrics.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::net::Radio;

/// Memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub free: u64,
    pub used: u64,
}

#[async_trait]
pub trait DeviceStats: Send + Sync {
    async fn memory(&self) -> Option<MemoryUsage>;
    async fn signal_strength(&self) -> Option<i32>;
}

/// Readings from procfs plus the radio's signal level.
pub struct ProcStats {
    meminfo: PathBuf,
    radio: Arc<dyn Radio>,
}

impl ProcStats {
    pub fn new(radio: Arc<dyn Radio>) -> Self {
        Self {
            meminfo: PathBuf::from("/proc/meminfo"),
            radio,
        }
    }

    pub fn with_meminfo(mut self, path: impl Into<PathBuf>) -> Self {
        self.meminfo = path.into();
        self
    }
}

#[async_trait]
impl DeviceStats for ProcStats {
    async fn memory(&self) -> Option<MemoryUsage> {
        let contents = tokio::fs::read_to_string(&self.meminfo).await.ok()?;
        parse_meminfo(&contents)
    }

    async fn signal_strength(&self) -> Option<i32> {
        self.radio.signal_strength().await
    }
}

/// Free and used memory from `/proc/meminfo`.
///
/// Free is `MemAvailable` (falling back to `MemFree`); used is total minus free.
pub fn parse_meminfo(contents: &str) -> Option<MemoryUsage> {
    let field = |name: &str| -> Option<u64> {
        contents.lines().find_map(|line| {
            let rest = line.strip_prefix(name)?.strip_prefix(':')?;
            let kb = rest.split_whitespace().next()?.parse::<u64>().ok()?;
            Some(kb * 1024)
        })
    };
    let total = field("MemTotal")?;
    let free = field("MemAvailable").or_else(|| field("MemFree"))?;
    Some(MemoryUsage {
        free,
        used: total.saturating_sub(free),
    })
}
