//! Audio output device enumeration
//!
//! A catalog is produced fresh on every call and never cached; an
//! unrecognized platform yields an empty catalog.

use crate::{AlsaMixer, MacosMixer, Platform};
use serde::{Deserialize, Serialize};

/// One selectable audio output device and its mixer channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Stable key used to address the device (ALSA card id, or `output`
    /// for the macOS master volume).
    pub key: String,

    /// Human-readable device name.
    pub name: String,

    /// Selectable mixer channel names, in listing order. Empty on platforms
    /// with a single master control.
    #[serde(default)]
    pub mixers: Vec<String>,
}

impl AudioDevice {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            mixers: Vec::new(),
        }
    }
}

/// List the audio output devices visible on the given platform.
pub fn list_devices(platform: Platform) -> Vec<AudioDevice> {
    match platform {
        Platform::MacOs => MacosMixer::devices(),
        Platform::Linux => AlsaMixer::devices(),
        Platform::Unknown => Vec::new(),
    }
}
