//! sysvol - system volume control from the command line
//!
//! One-shot invocations (`sysvol up`, `sysvol mute true`, ...) are mapped
//! onto the platform volume driver; running without a command starts the
//! interactive device/mixer selection.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use sysvol_config::{Settings, StateFile};
use sysvol_mixer::{
    create_mixer, list_devices, MemoryStore, Mixer, MixerState, Platform, StateStore,
};
use tracing::{debug, error, warn};

#[derive(Parser, Debug)]
#[command(name = "sysvol")]
#[command(about = "Control the system volume through the platform mixer", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Read settings from this file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Raise the volume
    Up {
        /// Step size; the configured step when omitted
        step: Option<i64>,
    },
    /// Lower the volume
    Down {
        /// Step size; the configured step when omitted
        step: Option<i64>,
    },
    /// Apply a signed volume change
    Change {
        #[arg(allow_negative_numbers = true)]
        step: Option<i64>,

        /// Allow the result to exceed the configured maximum
        #[arg(long)]
        ignore_limits: bool,
    },
    /// Set an absolute volume
    Set {
        #[arg(allow_negative_numbers = true)]
        volume: Option<i64>,

        /// Allow the volume to exceed the configured maximum
        #[arg(long)]
        ignore_limits: bool,
    },
    /// Mute (true) or unmute (false) the output
    Mute {
        /// Defaults to the current state when omitted
        state: Option<bool>,
    },
    /// Flip the mute state
    Mutetoggle,
    /// Print the current volume and mute state
    Status,
    /// List audio devices and their mixer controls
    Devices,
    /// Pick the device and mixer control to use
    Select,
    #[command(external_subcommand)]
    Other(Vec<String>),
}

fn main() {
    if let Err(err) = run() {
        error!("sysvol failed: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // The log level depends on the settings, so they are resolved before the
    // subscriber goes up and any load failure is reported right after.
    let loaded = match &cli.config {
        Some(path) => Settings::load(path),
        None => Settings::load_default(),
    };

    let debug_logging = cli.verbose || loaded.as_ref().map(|s| s.debug).unwrap_or(false);
    init_logging(debug_logging);

    let settings = match loaded {
        Ok(settings) => settings,
        Err(err) => {
            // An explicitly named config file must exist; the default one
            // may not, and defaults take over.
            if cli.config.is_some() {
                return Err(err.into());
            }
            warn!("failed to load settings, using defaults: {}", err);
            Settings::default()
        }
    };

    let store = state_store(cli.config.as_deref());
    let mut mixer = create_mixer(Platform::host(), settings.mixer_settings(), store);

    match cli.command {
        Some(Command::Up { step }) => {
            mixer.volume_up(step.unwrap_or(0));
            show_progress(mixer.as_ref(), &settings);
        }
        Some(Command::Down { step }) => {
            mixer.volume_down(step.unwrap_or(0));
            show_progress(mixer.as_ref(), &settings);
        }
        Some(Command::Change {
            step,
            ignore_limits,
        }) => {
            mixer.change_volume(step.unwrap_or(0), ignore_limits);
            show_progress(mixer.as_ref(), &settings);
        }
        Some(Command::Set {
            volume,
            ignore_limits,
        }) => {
            let target = volume.unwrap_or_else(|| mixer.state().volume);
            mixer.set_volume(target, ignore_limits);
            show_progress(mixer.as_ref(), &settings);
        }
        Some(Command::Mute { state }) => {
            let target = state.unwrap_or_else(|| mixer.state().muted);
            mixer.set_mute(target);
            show_progress(mixer.as_ref(), &settings);
        }
        Some(Command::Mutetoggle) => {
            mixer.toggle_mute();
            show_progress(mixer.as_ref(), &settings);
        }
        Some(Command::Status) => {
            let volume = mixer.volume();
            let muted = mixer.is_muted();
            println!(
                "{}: {}%{}",
                settings.mixer_name,
                volume,
                if muted { " [muted]" } else { "" }
            );
        }
        Some(Command::Devices) => print_devices(),
        Some(Command::Select) | None => {
            select_device(&settings, cli.config.as_deref())?;
        }
        Some(Command::Other(args)) => {
            debug!("unrecognized command {:?}, starting device selection", args);
            select_device(&settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// File-backed state store; falls back to an in-memory store when no config
/// directory is available.
fn state_store(config_override: Option<&Path>) -> Box<dyn StateStore> {
    let file = match config_override {
        Some(path) => {
            let dir = path.parent().unwrap_or(Path::new("."));
            Ok(StateFile::new(dir.join("state.toml")))
        }
        None => StateFile::at_default_location(),
    };

    match file {
        Ok(file) => Box::new(file),
        Err(err) => {
            warn!("state persistence unavailable: {}", err);
            Box::new(MemoryStore::new())
        }
    }
}

const METER_WIDTH: i64 = 20;

/// Render the feedback meter, e.g. `[########------------] 40%  Master`.
fn render_meter(state: &MixerState, settings: &Settings) -> String {
    let max = settings.max_volume.max(1);
    let filled = (state.volume.clamp(0, max) * METER_WIDTH / max) as usize;
    let width = METER_WIDTH as usize;

    format!(
        "[{}{}] {}%  {}{}",
        "#".repeat(filled),
        "-".repeat(width - filled),
        state.volume,
        settings.mixer_name,
        if state.muted { " [muted]" } else { "" },
    )
}

/// Print the feedback meter and keep it on screen for the configured time.
fn show_progress(mixer: &dyn Mixer, settings: &Settings) {
    if !settings.show_progress {
        return;
    }

    println!("{}", render_meter(&mixer.state(), settings));
    thread::sleep(Duration::from_millis(settings.progress_time));
}

fn print_devices() {
    let devices = list_devices(Platform::host());
    if devices.is_empty() {
        println!("No audio devices found.");
        return;
    }

    for device in &devices {
        println!("[{}] {}", device.key, device.name);
        for mixer in &device.mixers {
            println!("    {}", mixer);
        }
    }
}

/// Interactive selection: pick a device, then one of its mixer controls, and
/// persist both. Invalid input cancels without touching the settings.
fn select_device(settings: &Settings, config_override: Option<&Path>) -> Result<()> {
    let devices = list_devices(Platform::host());
    if devices.is_empty() {
        println!("No audio devices found.");
        return Ok(());
    }

    println!("Available devices:");
    for (index, device) in devices.iter().enumerate() {
        println!("  {}: [{}] {}", index, device.key, device.name);
    }

    let Some(choice) = prompt_index("Device", devices.len())? else {
        println!("Selection cancelled.");
        return Ok(());
    };
    let device = &devices[choice];

    let mixer_name = if device.mixers.is_empty() {
        String::new()
    } else {
        println!("Mixer controls on [{}]:", device.key);
        for (index, name) in device.mixers.iter().enumerate() {
            println!("  {}: {}", index, name);
        }

        let Some(choice) = prompt_index("Control", device.mixers.len())? else {
            println!("Selection cancelled.");
            return Ok(());
        };
        device.mixers[choice].clone()
    };

    let mut updated = settings.clone();
    updated.device_name = device.key.clone();
    updated.mixer_name = mixer_name;
    match config_override {
        Some(path) => updated.save(path)?,
        None => updated.save_default()?,
    }

    if updated.mixer_name.is_empty() {
        println!("Now controlling [{}] {}", device.key, device.name);
    } else {
        println!("Now controlling '{}' on [{}]", updated.mixer_name, device.key);
    }
    Ok(())
}

/// Ask for a number below `len`; anything else cancels the selection.
fn prompt_index(label: &str, len: usize) -> Result<Option<usize>> {
    print!("{} number: ", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    match line.trim().parse::<usize>() {
        Ok(index) if index < len => Ok(Some(index)),
        _ => Ok(None),
    }
}
