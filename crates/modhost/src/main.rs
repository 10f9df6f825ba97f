//! modhost - real-time host window for a modular synthesis engine
//!
//! This is the main entry point for the GUI application. It:
//! 1. Loads user preferences and negotiates the audio device
//! 2. Launches the iced window that drives the engine at 60 Hz
//!
//! Flags:
//! - `--list-devices` prints the available audio devices and exits
//! - `--prefs <path>` reads preferences from `path` instead of the config dir

mod demo;
mod ui;

use std::path::PathBuf;

use anyhow::Context;
use iced::Size;
use modhost_core::audio::{get_devices, AudioError, Direction};
use modhost_core::{default_prefs_path, load_prefs};

use ui::ModHostApp;

fn main() -> iced::Result {
    let args: Vec<String> = std::env::args().collect();

    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if args.iter().any(|arg| arg == "--list-devices") {
        if let Err(e) = list_devices() {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    let prefs_path = args
        .iter()
        .position(|arg| arg == "--prefs")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(default_prefs_path);

    log::info!("modhost starting up");
    let prefs = load_prefs(&prefs_path);
    let window_size = Size::new(prefs.width as f32, prefs.height as f32);

    let result = iced::application(
        move || ModHostApp::new(&prefs),
        ModHostApp::update,
        ModHostApp::view,
    )
    .subscription(ModHostApp::subscription)
    .title("modhost")
    .window_size(window_size)
    .run();

    log::info!("modhost stopped");
    result
}

/// Print every output and input device the audio layer can see
fn list_devices() -> anyhow::Result<()> {
    for direction in [Direction::Output, Direction::Input] {
        println!("{} devices:", direction);
        match get_devices(direction) {
            Ok(devices) => {
                for device in devices {
                    println!("  {}", device);
                }
            }
            Err(AudioError::NoDevices) => println!("  (none)"),
            Err(e) => return Err(e).with_context(|| format!("listing {} devices", direction)),
        }
    }
    Ok(())
}
