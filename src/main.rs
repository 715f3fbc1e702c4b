//! # FX10 Teleop
//!
//! Teleoperate an underwater vehicle with a Logitech gamepad.
//!
//! This application reads the gamepad, maps every input frame to a
//! pose/twist teleoperation command, publishes it, and triggers the control
//! subsystem's station-keeping and thruster services from button combos.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fx10_teleop::config::{Config, LoggingConfig};
use fx10_teleop::controller::device::{spawn_reader, GamepadDevice};
use fx10_teleop::publisher::UdpCommandPublisher;
use fx10_teleop::services::ControlServices;
use fx10_teleop::teleop::mapper::InputMapper;
use fx10_teleop::teleop::node::TeleopNode;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Log file name prefix inside `logging.log_dir`
const LOG_FILE_PREFIX: &str = "fx10-teleop.log";

/// Set up console logging, plus a daily rolling file when `log_dir` is set.
///
/// `RUST_LOG` overrides the configured level. The returned guard must live
/// until shutdown so buffered file output is flushed.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (file_layer, guard) = if config.log_dir.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Main entry point for FX10 Teleop
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first CLI argument, or `config/default.toml`)
///    - Set up logging
///    - Open the gamepad and the command publisher
///    - Wait for the control subsystem services (degraded mode on timeout)
///
/// 2. **Main Loop**
///    - The gamepad reader forwards one snapshot per input frame
///    - The teleop node maps, publishes and dispatches each snapshot in order
///    - Ctrl+C triggers shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration is invalid
/// - No gamepad can be opened
/// - The publisher socket cannot be bound
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load_or_default(&config_path)?;

    let _log_guard = init_logging(&config.logging);

    info!("FX10 Teleop v{} starting...", env!("CARGO_PKG_VERSION"));
    if config_path.exists() {
        info!("Loaded configuration from {}", config_path.display());
    } else {
        warn!("No configuration at {}, using defaults", config_path.display());
    }

    let node_name = config.node.name.clone();

    let gamepad = GamepadDevice::open_configured(&config.controller.device_path)?;
    info!(
        "Gamepad opened at: {} ({})",
        gamepad.device_path(),
        gamepad.name().unwrap_or("unknown")
    );

    let publisher = UdpCommandPublisher::bind(
        config.publisher_bind_addr()?,
        config.publisher_target_addr()?,
    )
    .await?;

    let services = ControlServices::connect(&node_name, &config.services, config.services_addr()?).await;

    let mapper = InputMapper::with_settings(config.mapping.settings());
    let node = TeleopNode::new(node_name.clone(), mapper, publisher, services)
        .with_stall(Duration::from_millis(config.mapping.disable_thrusters_stall_ms));

    let (tx, rx) = mpsc::channel(config.controller.queue_depth);
    let reader = spawn_reader(gamepad, tx)?;
    let mut pipeline = tokio::spawn(node.run(rx));

    info!("{}: teleoperation running", node_name);
    info!("Press Ctrl+C to exit");

    tokio::select! {
        result = &mut pipeline => {
            match result {
                Ok(stats) => warn!("Gamepad input ended after {} snapshots", stats.snapshots),
                Err(e) => error!("Mapping pipeline failed: {}", e),
            }
        }

        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            pipeline.abort();
        }
    }

    reader.abort();
    info!("{}: stopped", node_name);

    Ok(())
}
