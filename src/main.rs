use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use trainsign::clock::{ClockSync, DeviceClock, HttpTimeSource};
use trainsign::config::Config;
use trainsign::daemon::{LoopController, RecoveryConfig, RecoveryPolicy, RestartRequest, StartupConfig, TickConfig};
use trainsign::display::{ConsolePanel, Renderer};
use trainsign::net::{ConnectivityProbe, DEFAULT_PROBE_URL, HttpPool, Radio, SystemRadio};
use trainsign::telemetry::{ProcStats, TelemetryEmitter};
use trainsign::transit::{ArrivalFetcher, FetchSettings, HttpArrivalSource};

mod cli;

use cli::Cli;
use cli::commands::Commands;

/// Exit status asking the supervisor for a restart where re-exec is unavailable.
#[cfg(not(unix))]
const RESTART_EXIT_CODE: i32 = 75;

fn setup_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.is_verbose() { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level));

    if cli.stderr {
        builder.target(env_logger::Target::Stderr).init();
        return Ok(());
    }

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trainsign")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("trainsign.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Everything the commands share: one HTTP pool, one clock, one radio.
struct Device {
    pool: HttpPool,
    clock: DeviceClock,
    radio: Arc<SystemRadio>,
}

impl Device {
    fn new(config: &Config) -> Result<Self> {
        let pool = HttpPool::new(Duration::from_millis(config.transit.timeout_ms))
            .context("Failed to build HTTP client")?;
        let radio = Arc::new(SystemRadio::new(pool.clone(), config.wifi.clone()));
        Ok(Self {
            pool,
            clock: DeviceClock::new(),
            radio,
        })
    }

    fn clock_sync(&self, config: &Config) -> ClockSync<HttpTimeSource> {
        let source = HttpTimeSource::new(self.pool.clone(), &config.time.url);
        ClockSync::new(Arc::new(source), self.clock.clone())
    }

    fn fetcher(&self, config: &Config) -> ArrivalFetcher<HttpArrivalSource> {
        let source = HttpArrivalSource::new(self.pool.clone(), &config.transit);
        info!("Arrivals from {} (direction {})", source.url(), config.transit.direction);
        ArrivalFetcher::new(Arc::new(source), self.clock.clone(), FetchSettings::from(&config.transit))
    }

    fn probe(&self, config: &Config, url: Option<&str>) -> ConnectivityProbe {
        let url = url
            .or(config.probe_url.as_deref())
            .unwrap_or(DEFAULT_PROBE_URL);
        ConnectivityProbe::new(self.pool.clone(), url)
    }
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        None | Some(Commands::Run) => run_display(config).await,
        Some(Commands::Fetch { sync }) => handle_fetch_command(*sync, config).await,
        Some(Commands::Sync) => handle_sync_command(config).await,
        Some(Commands::Probe { url }) => handle_probe_command(url.as_deref(), config).await,
    }
}

async fn run_display(config: &Config) -> Result<()> {
    config.validate().context("Cannot start display loop")?;
    info!(
        "Connecting to WiFi SSID: {}",
        config.wifi.ssid.as_deref().unwrap_or_default()
    );

    let device = Device::new(config)?;
    let timing = &config.timing;

    let stats = Arc::new(ProcStats::new(device.radio.clone() as Arc<dyn Radio>));
    let telemetry = TelemetryEmitter::from_config(
        &config.telemetry,
        config.device.hostname.clone(),
        &device.pool,
        device.clock.clone(),
        stats,
    );

    let mut controller = LoopController::new(
        device.clock_sync(config),
        device.fetcher(config),
        device.radio.clone(),
        ConsolePanel::new(),
        telemetry,
        RecoveryPolicy::new(RecoveryConfig::from(timing)),
        TickConfig::from(timing),
        Instant::now(),
    );

    let startup = StartupConfig {
        clock_attempts: config.time.startup_attempts,
        clock_retry_delay: Duration::from_millis(config.time.startup_retry_delay_ms),
        stabilize: Duration::from_millis(timing.network_stabilize_ms),
    };
    let probe = device.probe(config, None);

    tokio::select! {
        restart = async {
            controller.start(&startup, Some(&probe)).await;
            controller.run().await
        } => restart_process(restart),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown requested");
            Ok(())
        }
    }
}

/// Replace this process with a fresh copy of itself, discarding all state.
#[cfg(unix)]
fn restart_process(request: RestartRequest) -> Result<()> {
    use std::os::unix::process::CommandExt;

    log::error!("Restarting after {} consecutive errors", request.error_count);
    log::logger().flush();

    let exe = std::env::current_exe().context("Failed to locate executable")?;
    let err = std::process::Command::new(exe).args(std::env::args_os().skip(1)).exec();
    Err(err).context("Failed to re-exec")
}

#[cfg(not(unix))]
fn restart_process(request: RestartRequest) -> Result<()> {
    log::error!("Exiting for restart after {} consecutive errors", request.error_count);
    log::logger().flush();
    std::process::exit(RESTART_EXIT_CODE)
}

async fn handle_fetch_command(sync: bool, config: &Config) -> Result<()> {
    let device = Device::new(config)?;
    if sync {
        device.clock_sync(config).sync().await.context("Clock sync failed")?;
    }
    let fetcher = device.fetcher(config);
    let settings = fetcher.settings();
    info!(
        "Fetching {}/{} arrivals at least {} min out",
        settings.queens_route, settings.manhattan_route, settings.min_minutes
    );
    let record = fetcher.fetch().await.context("Fetch failed")?;

    let mut panel = ConsolePanel::new();
    panel.render(&record);
    Ok(())
}

async fn handle_sync_command(config: &Config) -> Result<()> {
    let device = Device::new(config)?;
    let clock_sync = device.clock_sync(config);
    let offset = clock_sync.sync().await.context("Clock sync failed")?;
    println!(
        "{} {} (UTC offset {}, {} s)",
        "Local time:".green(),
        clock_sync.clock().now_local().format("%Y-%m-%d %H:%M:%S"),
        offset,
        offset.seconds()
    );
    Ok(())
}

async fn handle_probe_command(url: Option<&str>, config: &Config) -> Result<()> {
    let device = Device::new(config)?;
    println!("{} {}", "Interface:".green(), device.radio.interface());

    match device.radio.firmware_version().await {
        Ok(version) => println!("{} {}", "Firmware:".green(), version),
        Err(e) => println!("{} {}", "Firmware:".red(), e),
    }
    match device.radio.signal_strength().await {
        Some(level) => println!("{} {} dBm", "Signal:".green(), level),
        None => println!("{} unavailable", "Signal:".yellow()),
    }

    let probe = device.probe(config, url);
    match probe.check().await {
        Ok(status) => {
            println!("{} {} -> {}", "Reachable:".green(), probe.url(), status);
            Ok(())
        }
        Err(e) => {
            println!("{} {} -> {}", "Unreachable:".red(), probe.url(), e);
            Err(e).context("Connectivity probe failed")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging first
    setup_logging(&cli).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
