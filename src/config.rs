use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::TrainsignError;

/// Environment variable consulted when the config file has no SSID.
pub const WIFI_SSID_ENV: &str = "TRAINSIGN_WIFI_SSID";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub wifi: WifiConfig,
    pub transit: TransitConfig,
    pub time: TimeConfig,
    pub timing: TimingConfig,
    pub telemetry: TelemetryConfig,
    pub probe_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub hostname: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            hostname: "trainsign".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: Option<String>,
    pub interface: String,
    /// Command that power-cycles the wireless interface, e.g. `["nmcli", "radio", "wifi", "off"]`
    pub reset_command: Option<Vec<String>>,
    /// Command that (re)associates with the access point
    pub connect_command: Option<Vec<String>>,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: None,
            interface: "wlan0".to_string(),
            reset_command: None,
            connect_command: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    pub base_url: String,
    pub stop_id: String,
    pub direction: String,
    pub queens_route: String,
    pub manhattan_route: String,
    pub min_minutes: u32,
    pub timeout_ms: u64,
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.wheresthefuckingtrain.com".to_string(),
            stop_id: "F20".to_string(),
            direction: "N".to_string(),
            queens_route: "G".to_string(),
            manhattan_route: "F".to_string(),
            min_minutes: 5,
            timeout_ms: 10000,
        }
    }
}

impl TransitConfig {
    pub fn stop_url(&self) -> String {
        format!("{}/by-id/{}", self.base_url.trim_end_matches('/'), self.stop_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub url: String,
    pub startup_attempts: u32,
    pub startup_retry_delay_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            url: "https://worldtimeapi.org/api/timezone/America/New_York".to_string(),
            startup_attempts: 5,
            startup_retry_delay_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub tick_interval_secs: u64,
    pub clock_sync_interval_secs: u64,
    pub metrics_interval_secs: u64,
    pub error_reset_threshold: u32,
    pub soft_reset_settle_ms: u64,
    pub hard_reset_grace_ms: u64,
    pub network_stabilize_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 15,
            clock_sync_interval_secs: 30,
            metrics_interval_secs: 60,
            error_reset_threshold: 3,
            soft_reset_settle_ms: 2000,
            hard_reset_grace_ms: 1000,
            network_stabilize_ms: 3000,
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn clock_sync_interval(&self) -> Duration {
        Duration::from_secs(self.clock_sync_interval_secs)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_secs(self.metrics_interval_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub influx: Option<InfluxConfig>,
    pub loki: Option<LokiConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LokiConfig {
    pub url: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::locate(config_path)?;
        config.apply_env();
        Ok(config)
    }

    fn locate(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    fn apply_env(&mut self) {
        if self.wifi.ssid.as_deref().is_none_or(str::is_empty) {
            if let Ok(ssid) = std::env::var(WIFI_SSID_ENV) {
                self.wifi.ssid = Some(ssid);
            }
        }
    }

    /// Check the settings the loop cannot start without.
    pub fn validate(&self) -> std::result::Result<(), TrainsignError> {
        match self.wifi.ssid.as_deref() {
            Some(ssid) if !ssid.trim().is_empty() => {}
            _ => {
                return Err(TrainsignError::Config(format!(
                    "No WiFi SSID configured; set wifi.ssid or {}",
                    WIFI_SSID_ENV
                )));
            }
        }
        if self.timing.tick_interval_secs == 0 {
            return Err(TrainsignError::Config("timing.tick_interval_secs must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_device_constants() {
        let config = Config::default();
        assert_eq!(config.timing.tick_interval(), Duration::from_secs(15));
        assert_eq!(config.timing.clock_sync_interval(), Duration::from_secs(30));
        assert_eq!(config.timing.metrics_interval(), Duration::from_secs(60));
        assert_eq!(config.timing.error_reset_threshold, 3);
        assert_eq!(config.transit.min_minutes, 5);
        assert!(config.telemetry.influx.is_none());
        assert!(config.telemetry.loki.is_none());
    }

    #[test]
    fn test_stop_url() {
        let mut transit = TransitConfig::default();
        transit.base_url = "https://trains.example/".to_string();
        assert_eq!(transit.stop_url(), "https://trains.example/by-id/F20");
    }

    #[test]
    fn test_validate_requires_ssid() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TrainsignError::Config(_)));

        let mut config = Config::default();
        config.wifi.ssid = Some("   ".to_string());
        assert!(config.validate().is_err());

        config.wifi.ssid = Some("home".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_partial() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("trainsign.yml");
        fs::write(
            &path,
            r#"
wifi:
  ssid: platform
transit:
  stop_id: A42
  min_minutes: 3
telemetry:
  influx:
    url: http://influx.local:8086
    org: home
    bucket: sign
    token: secret
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.wifi.ssid.as_deref(), Some("platform"));
        assert_eq!(config.wifi.interface, "wlan0");
        assert_eq!(config.transit.stop_id, "A42");
        assert_eq!(config.transit.min_minutes, 3);
        assert_eq!(config.transit.queens_route, "G");
        assert_eq!(config.telemetry.influx.as_ref().unwrap().bucket, "sign");
        assert!(config.telemetry.loki.is_none());
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nope.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
