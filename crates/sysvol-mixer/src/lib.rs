//! Mixer abstraction and platform volume drivers
//!
//! Maps abstract volume operations (set, change, mute, toggle) onto the host
//! platform's mixer mechanism and keeps the observed volume/mute state
//! consistent in memory and in a pluggable state store.
//!
//! # Drivers
//!
//! - Linux/ALSA via the `amixer` utility
//! - macOS via AppleScript (`osascript`)
//! - an in-memory fallback for unrecognized platforms
//!
//! # Example
//!
//! ```no_run
//! use sysvol_mixer::{create_mixer, MemoryStore, Mixer, MixerSettings, Platform};
//!
//! let mut mixer = create_mixer(
//!     Platform::host(),
//!     MixerSettings::default(),
//!     Box::new(MemoryStore::new()),
//! );
//! let volume = mixer.volume_up(0);
//! println!("volume is now {volume}%");
//! ```

pub mod alsa;
pub mod devices;
pub mod macos;
pub mod mixer;
pub mod shell;

pub use alsa::AlsaMixer;
pub use devices::{list_devices, AudioDevice};
pub use macos::MacosMixer;
pub use mixer::{
    create_mixer, MemoryStore, Mixer, MixerSettings, MixerState, Platform, SoftMixer, StateStore,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MixerError {
    #[error("Mixer response did not match the expected format: {0}")]
    Parse(String),

    #[error("State store failed: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
