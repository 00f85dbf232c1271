//! Wireless interface control.
//!
//! The radio is the device's network co-processor. A soft reset closes every
//! socket, power-cycles the interface and re-associates.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::config::WifiConfig;
use crate::error::{Result, TrainsignError};
use crate::net::HttpPool;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Radio: Send + Sync {
    /// Close every open network connection.
    async fn close_all_sockets(&self) -> Result<()>;

    /// Power-cycle the network co-processor.
    async fn reset(&self) -> Result<()>;

    /// (Re-)establish the network connection.
    async fn connect(&self) -> Result<()>;

    /// Received signal level in dBm, if the interface reports one.
    async fn signal_strength(&self) -> Option<i32>;

    /// Driver / firmware identification.
    async fn firmware_version(&self) -> Result<String>;
}

/// Radio backed by a Linux wireless interface.
#[derive(Debug, Clone)]
pub struct SystemRadio {
    pool: HttpPool,
    config: WifiConfig,
    sysfs_root: PathBuf,
    procfs_root: PathBuf,
}

impl SystemRadio {
    pub fn new(pool: HttpPool, config: WifiConfig) -> Self {
        Self {
            pool,
            config,
            sysfs_root: PathBuf::from("/sys/class/net"),
            procfs_root: PathBuf::from("/proc/net"),
        }
    }

    pub fn interface(&self) -> &str {
        &self.config.interface
    }

    fn operstate(&self) -> Option<String> {
        let path = self.sysfs_root.join(&self.config.interface).join("operstate");
        std::fs::read_to_string(path).ok().map(|s| s.trim().to_string())
    }
}

#[async_trait]
impl Radio for SystemRadio {
    async fn close_all_sockets(&self) -> Result<()> {
        self.pool.close_all()
    }

    async fn reset(&self) -> Result<()> {
        match &self.config.reset_command {
            Some(argv) => run_command(argv).await,
            None => {
                log::debug!("No reset command for {}, skipping radio power-cycle", self.config.interface);
                Ok(())
            }
        }
    }

    async fn connect(&self) -> Result<()> {
        if let Some(argv) = &self.config.connect_command {
            run_command(argv).await?;
        }
        match self.operstate().as_deref() {
            Some("up") | Some("unknown") | None => Ok(()),
            Some(state) => Err(TrainsignError::Radio(format!(
                "{} is {} after connect",
                self.config.interface, state
            ))),
        }
    }

    async fn signal_strength(&self) -> Option<i32> {
        let contents = tokio::fs::read_to_string(self.procfs_root.join("wireless")).await.ok()?;
        parse_wireless_level(&contents, &self.config.interface)
    }

    async fn firmware_version(&self) -> Result<String> {
        let link = self.sysfs_root.join(&self.config.interface).join("device").join("driver");
        let target = tokio::fs::read_link(&link).await?;
        let driver = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| TrainsignError::Radio(format!("{} has no driver name", link.display())))?;
        let version_path = PathBuf::from("/sys/module").join(&driver).join("version");
        match tokio::fs::read_to_string(version_path).await {
            Ok(version) => Ok(format!("{} {}", driver, version.trim())),
            Err(_) => Ok(driver),
        }
    }
}

async fn run_command(argv: &[String]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| TrainsignError::Config("empty radio command".to_string()))?;

    log::debug!("Running radio command: {}", argv.join(" "));
    let output = tokio::time::timeout(
        COMMAND_TIMEOUT,
        Command::new(program)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output(),
    )
    .await
    .map_err(|_| TrainsignError::Radio(format!("'{}' timed out", program)))??;

    if output.status.success() {
        Ok(())
    } else {
        Err(TrainsignError::Radio(format!(
            "'{}' exited with {}: {}",
            argv.join(" "),
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

/// Extract the signal level (dBm) for `interface` from `/proc/net/wireless`.
pub fn parse_wireless_level(contents: &str, interface: &str) -> Option<i32> {
    contents.lines().find_map(|line| {
        let (name, rest) = line.trim_start().split_once(':')?;
        if name != interface {
            return None;
        }
        // status, link quality, signal level, noise ...
        let level = rest.split_whitespace().nth(2)?;
        let level = level.trim_end_matches('.').parse::<f64>().ok()?;
        Some(level.round() as i32)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WIRELESS: &str = "Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
 wlan0: 0000   54.  -56.  -256        0      0      0      0     12        0
";

    fn radio_in(temp: &TempDir, config: WifiConfig) -> SystemRadio {
        let mut radio = SystemRadio::new(HttpPool::new(Duration::from_secs(1)).unwrap(), config);
        radio.sysfs_root = temp.path().join("sys");
        radio.procfs_root = temp.path().join("proc");
        radio
    }

    #[test]
    fn test_parse_wireless_level() {
        assert_eq!(parse_wireless_level(WIRELESS, "wlan0"), Some(-56));
    }

    #[test]
    fn test_parse_wireless_level_unknown_interface() {
        assert_eq!(parse_wireless_level(WIRELESS, "wlan1"), None);
        assert_eq!(parse_wireless_level("", "wlan0"), None);
    }

    #[tokio::test]
    async fn test_close_all_sockets_resets_pool() {
        let temp = TempDir::new().unwrap();
        let radio = radio_in(&temp, WifiConfig::default());
        radio.close_all_sockets().await.unwrap();
        assert_eq!(radio.pool.generation(), 1);
    }

    #[tokio::test]
    async fn test_reset_without_command_is_noop() {
        let temp = TempDir::new().unwrap();
        let radio = radio_in(&temp, WifiConfig::default());
        assert!(radio.reset().await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_reset_command_is_radio_error() {
        let temp = TempDir::new().unwrap();
        let config = WifiConfig {
            reset_command: Some(vec!["sh".to_string(), "-c".to_string(), "exit 3".to_string()]),
            ..Default::default()
        };
        let radio = radio_in(&temp, config);
        let err = radio.reset().await.unwrap_err();
        assert!(matches!(err, TrainsignError::Radio(_)));
    }

    #[tokio::test]
    async fn test_connect_checks_operstate() {
        let temp = TempDir::new().unwrap();
        let iface = temp.path().join("sys").join("wlan0");
        std::fs::create_dir_all(&iface).unwrap();

        std::fs::write(iface.join("operstate"), "up\n").unwrap();
        let radio = radio_in(&temp, WifiConfig::default());
        assert!(radio.connect().await.is_ok());

        std::fs::write(iface.join("operstate"), "down\n").unwrap();
        assert!(radio.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_signal_strength_from_procfs() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("proc")).unwrap();
        std::fs::write(temp.path().join("proc").join("wireless"), WIRELESS).unwrap();
        let radio = radio_in(&temp, WifiConfig::default());
        assert_eq!(radio.signal_strength().await, Some(-56));
    }
}
