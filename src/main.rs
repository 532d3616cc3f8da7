//! # RC Bridge
//!
//! Drive an RC vehicle with a game controller and head tracker via CRSF.
//!
//! This daemon runs the bridge control loop: controller and head-tracking
//! inputs are shaped, normalized, mapped into 16 RC channels, encoded as
//! CRSF-style frames, and written to the RF transmitter module on a fixed
//! cadence.

use anyhow::Result;
use tokio::time::{interval, Duration};
use tracing::{debug, info};
use tracing_subscriber;

mod bridge;
mod config;
mod control;
mod crsf;
mod error;
mod input;
mod serial;

use bridge::Bridge;
use config::Config;

/// Default configuration file path
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Number of frames between status log messages (~20 seconds at 50Hz)
const LOG_INTERVAL_FRAMES: u64 = 1000;

/// Main entry point for RC Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (path from argv, falling back to
///      `config/default.toml`, falling back to built-in defaults)
///    - Build the bridge and attach whatever devices are present
///
/// 2. **Main Loop** (three cadences)
///    - Fast tick (default 20ms): sample, shape, encode, transmit
///    - Status tick (default 200ms): log loop state
///    - Reconnect tick (default 1s): rediscover absent devices
///
/// 3. **Graceful Shutdown** (Ctrl+C)
///    - Close sink and sensor, log total frame count, clean exit
///
/// # Errors
///
/// Returns error if the configuration file is invalid. Absent devices are
/// not errors - the loop runs on neutral values until they appear.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("RC Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let tick_period = Duration::from_millis(config.control.tick_period_ms);
    let status_period = Duration::from_millis(config.control.status_interval_ms);
    let reconnect_period = Duration::from_millis(config.serial.reconnect_interval_ms);

    let mut bridge = Bridge::new(config)?;
    bridge.rediscover();

    let mut fast_tick = interval(tick_period);
    let mut status_tick = interval(status_period);
    let mut reconnect_tick = interval(reconnect_period);

    info!(
        "Control loop running at {}ms tick ({}Hz)",
        tick_period.as_millis(),
        1000 / tick_period.as_millis().max(1)
    );
    info!("Press Ctrl+C to exit");

    let mut last_log_count: u64 = 0;

    loop {
        tokio::select! {
            // Fast tick: the whole pipeline, input to transmitted frame
            _ = fast_tick.tick() => {
                bridge.tick().await;

                let sent = bridge.frames_sent();
                if sent - last_log_count >= LOG_INTERVAL_FRAMES {
                    info!("Sent {} frames", sent);
                    last_log_count = sent;
                }
            }

            // Slow tick: status only, never touches transmitted data
            _ = status_tick.tick() => {
                let status = bridge.status();
                debug!(
                    "S: {:+.2}  T: {:.2}  Yaw: {:+.1}  Pitch: {:+.1}{}{}",
                    status.steering,
                    status.throttle,
                    status.yaw,
                    status.pitch,
                    if status.reverse { "  REVERSE" } else { "" },
                    if status.paused { "  [paused]" } else { "" },
                );
            }

            // Device discovery/reconnection cadence
            _ = reconnect_tick.tick() => {
                bridge.rediscover();
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    bridge.shutdown();
    Ok(())
}

/// Loads configuration from argv[1], the default path, or built-in defaults.
fn load_config() -> Result<Config> {
    if let Some(path) = std::env::args().nth(1) {
        info!("Loading configuration from {}", path);
        return Ok(Config::load(&path)?);
    }

    if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
        info!("Loading configuration from {}", DEFAULT_CONFIG_PATH);
        return Ok(Config::load(DEFAULT_CONFIG_PATH)?);
    }

    info!("No configuration file found, using defaults");
    let config = Config::default();
    config.validate()?;
    Ok(config)
}
