//! soxctl - command-line controller for SoX sound servers.
//!
//! Runs one command against a configured (or ad-hoc) device and prints the
//! resulting state, or watches every configured device until interrupted.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sox_core::protocol_constants::DEFAULT_PORT;
use sox_core::{
    test_connection, BroadcastEventBridge, DevicePoller, DeviceRegistry, LoggingEventEmitter,
    SoxClientImpl, SoxDevice, SoxError, TokioSpawner,
};
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;

use crate::config::CliConfig;

/// soxctl - Control SoX sound servers over their line protocol.
#[derive(Parser, Debug)]
#[command(name = "soxctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE", env = "SOXCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "warn", env = "SOXCTL_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Ad-hoc sound server host (replaces the configured devices).
    #[arg(long, env = "SOXCTL_HOST")]
    host: Option<String>,

    /// Port of the ad-hoc sound server.
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT, env = "SOXCTL_PORT")]
    port: u16,

    /// Device to address, by name or unique id. Optional with a single device.
    #[arg(short, long)]
    device: Option<String>,

    /// Print state as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the device answers an empty exchange.
    Probe,
    /// Refresh and print device state (every device when none is selected).
    Status,
    /// Replay the last requested media.
    Play,
    /// Stop playback.
    Stop,
    /// Play a media id.
    PlayMedia {
        /// Media type: music or playlist.
        #[arg(value_name = "TYPE")]
        media_type: String,
        /// Media id handed to the server, usually a URL.
        media_id: String,
    },
    /// Set the volume level (0.0 - 1.0).
    Volume { level: f64 },
    /// Mute (sets the volume to zero and remembers it).
    Mute,
    /// Restore the volume from before muting.
    Unmute,
    /// Raise the volume by one step.
    VolumeUp,
    /// Lower the volume by one step.
    VolumeDown,
    /// Poll every device and print state changes until interrupted.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::debug!("soxctl v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let cli_config =
        CliConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    let config = cli_config.to_core_config(args.host.as_deref(), args.port);
    config
        .validate()
        .map_err(SoxError::from)
        .context("Invalid configuration")?;

    log::info!(
        "Configuration: {} device(s), connect_timeout={}s, read_timeout={}s",
        config.devices.len(),
        config.connect_timeout_secs,
        config.read_timeout_secs
    );

    let transport = Arc::new(SoxClientImpl::new(config.timeouts()));

    match args.command {
        Command::Probe => {
            let registry =
                DeviceRegistry::from_config(&config, transport, Arc::new(LoggingEventEmitter));
            let device = resolve_device(&registry, args.device.as_deref())?;
            let endpoint = device.endpoint();
            match test_connection(&endpoint.host, endpoint.port, &config.timeouts()).await {
                Ok(()) => {
                    println!("ok");
                    Ok(())
                }
                Err(e) => {
                    println!("cannot_connect");
                    Err(e).with_context(|| format!("Cannot connect to {}", endpoint))
                }
            }
        }
        Command::Watch => {
            let bridge = BroadcastEventBridge::new(64);
            bridge.set_external_emitter(Arc::new(LoggingEventEmitter));
            let registry = Arc::new(DeviceRegistry::from_config(
                &config,
                transport,
                Arc::new(bridge.clone()),
            ));
            if registry.is_empty() {
                bail!("No devices configured. Use --host or a config file");
            }
            watch(registry, bridge, &config).await
        }
        Command::Status => {
            let registry =
                DeviceRegistry::from_config(&config, transport, Arc::new(LoggingEventEmitter));
            let devices = match args.device.as_deref() {
                Some(key) => vec![resolve_device(&registry, Some(key))?],
                None => registry.list(),
            };
            for device in &devices {
                device.poll().await;
            }
            print_status(&devices, args.json)
        }
        command => {
            let registry =
                DeviceRegistry::from_config(&config, transport, Arc::new(LoggingEventEmitter));
            let device = resolve_device(&registry, args.device.as_deref())?;

            // Refresh first so volume commands see the server's current level.
            device.poll().await;
            run_command(&device, command)
                .await
                .map_err(SoxError::from)
                .with_context(|| format!("Command failed on {}", device.name()))?;
            print_status(&[device], args.json)
        }
    }
}

/// Picks the addressed device, or the only one when no key is given.
fn resolve_device(registry: &DeviceRegistry, key: Option<&str>) -> Result<Arc<SoxDevice>> {
    if let Some(key) = key {
        return registry
            .find(key)
            .ok_or_else(|| SoxError::DeviceNotFound(key.to_string()).into());
    }

    let devices = registry.list();
    match devices.as_slice() {
        [only] => Ok(Arc::clone(only)),
        [] => bail!("No devices configured. Use --host or a config file"),
        _ => bail!(
            "{} devices configured; choose one with --device",
            devices.len()
        ),
    }
}

async fn run_command(device: &SoxDevice, command: Command) -> sox_core::DeviceResult<()> {
    match command {
        Command::Play => device.play().await,
        Command::Stop => device.stop().await,
        Command::PlayMedia {
            media_type,
            media_id,
        } => device.play_media(&media_type, &media_id).await,
        Command::Volume { level } => device.set_volume_level(level).await,
        Command::Mute => device.mute(true).await,
        Command::Unmute => device.mute(false).await,
        Command::VolumeUp => device.volume_up().await,
        Command::VolumeDown => device.volume_down().await,
        Command::Probe | Command::Status | Command::Watch => Ok(()),
    }
}

/// Printable snapshot of one device.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    id: String,
    name: String,
    connectivity: sox_core::Connectivity,
    available: bool,
    playback: sox_core::PlaybackState,
    volume_level: Option<f64>,
    is_volume_muted: bool,
    last_media_id: Option<String>,
    supported_features: u32,
}

impl StatusView {
    fn of(device: &SoxDevice) -> Self {
        let state = device.state();
        Self {
            id: device.unique_id().to_string(),
            name: device.name().to_string(),
            connectivity: state.connectivity(),
            available: state.available(),
            playback: state.playback(),
            volume_level: state.volume_level,
            is_volume_muted: state.is_volume_muted,
            last_media_id: state.last_media_id.clone(),
            supported_features: state.supported_features().bits(),
        }
    }
}

fn print_status(devices: &[Arc<SoxDevice>], json: bool) -> Result<()> {
    let views: Vec<StatusView> = devices.iter().map(|d| StatusView::of(d)).collect();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&views).context("Failed to serialize status")?
        );
        return Ok(());
    }

    for view in views {
        let volume = view
            .volume_level
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "{} ({}): {}, {}, volume {}{}",
            view.name,
            view.id,
            view.connectivity,
            view.playback,
            volume,
            if view.is_volume_muted { " (muted)" } else { "" }
        );
    }
    Ok(())
}

/// Runs the poller and prints every event as a JSON line until a shutdown signal.
async fn watch(
    registry: Arc<DeviceRegistry>,
    bridge: BroadcastEventBridge,
    config: &sox_core::Config,
) -> Result<()> {
    let mut events = bridge.subscribe();
    let poller = Arc::new(DevicePoller::new(
        Arc::clone(&registry),
        config.poll_interval(),
    ));
    Arc::clone(&poller).start(&TokioSpawner::current());

    log::info!("Watching {} device(s), Ctrl+C to stop", registry.len());

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                log::info!("Shutdown signal received");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    println!(
                        "{}",
                        serde_json::to_string(&event).context("Failed to serialize event")?
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Event stream lagged, skipped {} event(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    poller.shutdown();
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
