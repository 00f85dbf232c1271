//! Recovery policy - what to do after a failed tick
//!
//! Every classified failure gets a soft reset: close all sockets,
//! power-cycle the radio, let it settle, reconnect. Past the threshold the
//! device also restarts.

use std::time::Duration;

use crate::config::TimingConfig;
use crate::net::Radio;

/// Recovery action chosen for a given error count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryDecision {
    /// No failure to recover from
    Continue,
    /// Reset sockets and radio
    SoftReset,
    /// Soft reset, then restart the device
    HardReset,
}

/// Result of carrying out a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Nothing was done
    None,
    /// Soft reset performed; `network_ok` is false if any step of it failed
    SoftReset { network_ok: bool },
    /// Soft reset performed and the grace delay elapsed; caller must restart
    Restart,
}

/// Configuration for recovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryConfig {
    /// Restart once the error count exceeds this
    pub error_reset_threshold: u32,
    /// Pause between radio reset and reconnect
    pub settle: Duration,
    /// Pause before a restart
    pub restart_grace: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for RecoveryConfig {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            error_reset_threshold: timing.error_reset_threshold,
            settle: Duration::from_millis(timing.soft_reset_settle_ms),
            restart_grace: Duration::from_millis(timing.hard_reset_grace_ms),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecoveryPolicy {
    config: RecoveryConfig,
}

impl RecoveryPolicy {
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Pure decision on the consecutive error count.
    pub fn decide(&self, error_count: u32) -> RecoveryDecision {
        if error_count == 0 {
            RecoveryDecision::Continue
        } else if error_count > self.config.error_reset_threshold {
            RecoveryDecision::HardReset
        } else {
            RecoveryDecision::SoftReset
        }
    }

    /// Carry out a decision against the radio.
    pub async fn apply<R: Radio + ?Sized>(&self, decision: RecoveryDecision, radio: &R) -> RecoveryAction {
        match decision {
            RecoveryDecision::Continue => RecoveryAction::None,
            RecoveryDecision::SoftReset => RecoveryAction::SoftReset {
                network_ok: self.soft_reset(radio).await,
            },
            RecoveryDecision::HardReset => {
                self.soft_reset(radio).await;
                log::error!("Too many errors, full reset in {:?}", self.config.restart_grace);
                tokio::time::sleep(self.config.restart_grace).await;
                RecoveryAction::Restart
            }
        }
    }

    /// Returns true when every step succeeded. Failed steps are logged and
    /// the sequence carries on; the next tick decides what happens next.
    async fn soft_reset<R: Radio + ?Sized>(&self, radio: &R) -> bool {
        let mut ok = true;
        if let Err(e) = radio.close_all_sockets().await {
            log::warn!("Closing sockets failed: {}", e);
            ok = false;
        }
        if let Err(e) = radio.reset().await {
            log::warn!("Radio reset failed: {}", e);
            ok = false;
        }
        tokio::time::sleep(self.config.settle).await;
        if let Err(e) = radio.connect().await {
            log::warn!("Reconnect failed: {}", e);
            ok = false;
        }
        ok
    }
}
