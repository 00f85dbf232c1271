//! Loop controller - the resident control loop
//!
//! Owns the [`LoopState`] and drives every other component. It is the only
//! place that decides to reset the radio or the device.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::Level;

use crate::clock::{ClockSync, TimeSource};
use crate::daemon::{LoopState, RecoveryAction, RecoveryPolicy, TickConfig, TickOutcome};
use crate::display::Renderer;
use crate::domain::ArrivalRecord;
use crate::error::Result;
use crate::net::{ConnectivityProbe, Radio};
use crate::telemetry::TelemetryEmitter;
use crate::transit::{ArrivalFetcher, ArrivalSource};

/// Remote log lines held back while the network is down.
const MAX_PENDING_LOGS: usize = 16;

/// Returned by [`LoopController::run`] when the device must restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest {
    pub error_count: u32,
}

/// Cold-start settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Clock sync attempts before giving up and running with offset 0
    pub clock_attempts: u32,
    pub clock_retry_delay: Duration,
    /// Pause after connecting and after the first clock sync
    pub stabilize: Duration,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            clock_attempts: 5,
            clock_retry_delay: Duration::from_secs(2),
            stabilize: Duration::from_secs(3),
        }
    }
}

pub struct LoopController<T, A, R, P>
where
    T: TimeSource,
    A: ArrivalSource,
    R: Radio,
    P: Renderer,
{
    clock_sync: ClockSync<T>,
    fetcher: ArrivalFetcher<A>,
    radio: Arc<R>,
    renderer: P,
    telemetry: TelemetryEmitter,
    policy: RecoveryPolicy,
    config: TickConfig,
    state: LoopState,
    last_record: Option<ArrivalRecord>,
    pending_logs: VecDeque<(Level, String)>,
}

impl<T, A, R, P> LoopController<T, A, R, P>
where
    T: TimeSource,
    A: ArrivalSource,
    R: Radio,
    P: Renderer,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clock_sync: ClockSync<T>,
        fetcher: ArrivalFetcher<A>,
        radio: Arc<R>,
        renderer: P,
        telemetry: TelemetryEmitter,
        policy: RecoveryPolicy,
        config: TickConfig,
        start_time: Instant,
    ) -> Self {
        Self {
            clock_sync,
            fetcher,
            radio,
            renderer,
            telemetry,
            policy,
            config,
            state: LoopState::new(start_time),
            last_record: None,
            pending_logs: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn renderer(&self) -> &P {
        &self.renderer
    }

    /// The record currently on the panel.
    pub fn last_record(&self) -> Option<&ArrivalRecord> {
        self.last_record.as_ref()
    }

    pub fn pending_logs(&self) -> usize {
        self.pending_logs.len()
    }

    /// Cold start: blank panel, connect, bounded clock sync, connectivity probe.
    ///
    /// Nothing here is fatal. A clock that cannot be synced stays at offset 0
    /// and the first tick tries again.
    pub async fn start(&mut self, startup: &StartupConfig, probe: Option<&ConnectivityProbe>) {
        self.renderer.render(&ArrivalRecord::empty());
        log::info!(
            "Device restarts after more than {} consecutive errors",
            self.policy.config().error_reset_threshold
        );

        match self.radio.firmware_version().await {
            Ok(version) => log::info!("Radio firmware: {}", version),
            Err(e) => log::warn!("Could not get radio firmware: {}", e),
        }

        if let Err(e) = self.radio.connect().await {
            log::warn!("Initial connect failed: {}", e);
        }
        tokio::time::sleep(startup.stabilize).await;

        match self
            .clock_sync
            .sync_with_retry(startup.clock_attempts, startup.clock_retry_delay)
            .await
        {
            Ok(_) => self.state.last_clock_sync = Some(Instant::now()),
            Err(e) => log::warn!("Starting with unsynced clock: {}", e),
        }
        tokio::time::sleep(startup.stabilize).await;

        if let Some(probe) = probe {
            match probe.check().await {
                Ok(status) => log::info!("Connectivity probe {} answered {}", probe.url(), status),
                Err(e) => log::warn!("Connectivity probe {} failed: {}", probe.url(), e),
            }
        }

        self.queue_log(Level::Info, format!("Started {} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));
    }

    /// Run until the recovery policy asks for a restart.
    pub async fn run(&mut self) -> RestartRequest {
        loop {
            if let TickOutcome::Restart { error_count } = self.tick(Instant::now()).await {
                return RestartRequest { error_count };
            }
            log::debug!("Sleeping for {:?}", self.config.tick_interval);
            tokio::time::sleep(self.config.tick_interval).await;
        }
    }

    /// One pass of the task sequence inside a single failure boundary.
    pub async fn tick(&mut self, now: Instant) -> TickOutcome {
        match self.run_tasks(now).await {
            Ok(record) => {
                self.state.record_success();
                let metrics_sent = self.send_telemetry(now).await;
                TickOutcome::Success { record, metrics_sent }
            }
            Err(e) => {
                let kind = e.kind();
                let error_count = self.state.record_failure();
                log::error!("Tick failed ({}): {}", kind, e);

                let decision = self.policy.decide(error_count);
                log::warn!("Recovering with {:?}, error count {}", decision, error_count);
                match self.policy.apply(decision, self.radio.as_ref()).await {
                    RecoveryAction::Restart => TickOutcome::Restart { error_count },
                    _ => {
                        self.queue_log(
                            Level::Error,
                            format!("{} error: {}; soft reset, error count {}", kind, e, error_count),
                        );
                        TickOutcome::Failed { kind, error_count }
                    }
                }
            }
        }
    }

    async fn run_tasks(&mut self, now: Instant) -> Result<ArrivalRecord> {
        if self.state.clock_sync_due(now, self.config.clock_sync_interval) {
            self.clock_sync.sync().await?;
            self.state.last_clock_sync = Some(now);
        }

        let record = self.fetcher.fetch().await?;
        self.renderer.render(&record);
        self.last_record = Some(record);
        Ok(record)
    }

    /// Flush held-back log lines, then metrics if due. Never fails.
    async fn send_telemetry(&mut self, now: Instant) -> bool {
        while let Some((level, message)) = self.pending_logs.pop_front() {
            self.telemetry.emit_log(level, &message).await;
        }

        if !self.state.telemetry_due(now, self.config.metrics_interval) {
            return false;
        }
        self.state.last_telemetry_send = Some(now);
        self.telemetry
            .emit_metrics(self.state.uptime(now), self.state.total_failures)
            .await
    }

    fn queue_log(&mut self, level: Level, message: String) {
        if !self.telemetry.has_log_sink() {
            return;
        }
        if self.pending_logs.len() == MAX_PENDING_LOGS {
            self.pending_logs.pop_front();
        }
        self.pending_logs.push_back((level, message));
    }
}
