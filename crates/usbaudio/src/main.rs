//! usbaudio
//!
//! Enables AOA2 audio forwarding on a connected Android device and plays the
//! resulting PulseAudio input source with VLC.

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use protocol::{LookupCriterion, UsbId};
use std::path::PathBuf;
use tracing::{error, info};
use usbaudio::config::AppConfig;
use usbaudio::player::{PLAYER_ENV, PlayerCommand};
use usbaudio::{enable_accessory_audio, find_devices, lookup_source_index, needs_settle_delay};

#[derive(Parser, Debug)]
#[command(name = "usbaudio")]
#[command(
    author,
    version,
    about = "Forward Android device audio over USB (AOA2) and play it"
)]
#[command(long_about = "
Switches an Android device to AOA2 audio accessory mode, finds the PulseAudio
input source it exposes, and plays it with VLC.

Without --serial or --device, the single device exposing an ADB interface is
selected.

EXAMPLES:
    # Forward and play the only device with ADB enabled
    usbaudio

    # Select by serial, do not start the player
    usbaudio --serial 0123456789ABCDEF --no-play

    # Select by vendor:product id
    usbaudio --device 18d1:4ee7

ENVIRONMENT:
    VLC        Player executable (default: vlc)
    RUST_LOG   Log filter, overrides --log-level
")]
struct Args {
    /// Lookup the USB device by serial
    #[arg(short, long, value_name = "SERIAL", conflicts_with = "device")]
    serial: Option<String>,

    /// Lookup the USB device by vid:pid (hex)
    #[arg(short, long, value_name = "VID:PID")]
    device: Option<UsbId>,

    /// Do not play the input source matching the device
    #[arg(short, long)]
    no_play: bool,

    /// Forward the option to VLC [default: 50]
    #[arg(long, value_name = "MS")]
    live_caching: Option<u32>,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List devices matching the lookup and exit, without enabling audio
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let path = AppConfig::default_path();
        AppConfig::default()
            .save(&path)
            .context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = match args.config {
        Some(ref path) => {
            AppConfig::load(Some(path.clone())).context("Failed to load configuration")?
        }
        None => AppConfig::load_or_default(),
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.general.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    let criterion = config.criterion(args.serial.clone(), args.device)?;

    let result = if args.list_devices {
        list_devices_mode(&config, &criterion)
    } else {
        run(&args, &config, &criterion)
    };

    if let Err(ref e) = result {
        error!("{:#}", e);
    }
    result
}

/// Print the devices matching the lookup
fn list_devices_mode(config: &AppConfig, criterion: &LookupCriterion) -> Result<()> {
    let context = rusb::Context::new().context("Could not initialize USB")?;
    let devices = find_devices(&context, criterion, config.usb.max_devices)?;

    if devices.is_empty() {
        println!("No USB devices found for {}.", criterion);
    } else {
        println!("Found {} USB device(s) for {}:\n", devices.len(), criterion);
        for device in devices {
            println!("  {}", device);
            device.close();
        }
    }

    Ok(())
}

/// Enable audio forwarding, then hand the matching source to the player
fn run(args: &Args, config: &AppConfig, criterion: &LookupCriterion) -> Result<()> {
    let context = rusb::Context::new().context("Could not initialize USB")?;

    let (device, _version) = enable_accessory_audio(&context, criterion, config.usb.max_devices)?;

    if args.no_play || !config.player.enabled {
        device.close();
        return Ok(());
    }

    if needs_settle_delay(&device) {
        info!("Waiting for input source...");
        std::thread::sleep(config.usb.settle_delay());
    }

    let source_index = lookup_source_index(&device.serial);
    device.close();
    drop(context);
    let source_index = source_index?;

    let program = PlayerCommand::resolve_program(
        std::env::var(PLAYER_ENV).ok(),
        &config.player.command,
    );
    let live_caching = args.live_caching.unwrap_or(config.player.live_caching_ms);

    let err = PlayerCommand::new(program, live_caching, source_index).exec();
    Err(err.into())
}
