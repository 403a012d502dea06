//! Platform-agnostic mixer behavior
//!
//! The [`Mixer`] trait is the capability surface the rest of the system
//! programs against. Platform drivers ([`crate::AlsaMixer`],
//! [`crate::MacosMixer`]) round-trip every operation through the OS audio
//! subsystem; [`SoftMixer`] is the fallback for unrecognized platforms and
//! keeps state in memory only.

use crate::alsa::AlsaMixer;
use crate::macos::MacosMixer;
use crate::MixerError;

/// Host platform, normalized once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Unknown,
}

impl Platform {
    /// Detect the platform this process is running on.
    pub fn host() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Normalize an OS identifier as reported by the standard library.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::MacOs,
            "linux" => Platform::Linux,
            _ => Platform::Unknown,
        }
    }
}

/// Immutable mixer construction parameters.
#[derive(Debug, Clone)]
pub struct MixerSettings {
    /// Audio device to address (ALSA card id, or the AppleScript volume
    /// channel, usually `output`).
    pub device_name: String,

    /// Mixer control/channel on that device. Unused on macOS.
    pub mixer_name: String,

    /// Default increment for [`Mixer::volume_up`].
    pub step_up: i64,

    /// Default decrement for [`Mixer::volume_down`].
    pub step_down: i64,

    /// Upper volume bound enforced unless an operation ignores limits.
    pub max_volume: i64,
}

impl Default for MixerSettings {
    fn default() -> Self {
        Self {
            device_name: "default".to_string(),
            mixer_name: "Master".to_string(),
            step_up: 5,
            step_down: 5,
            max_volume: 100,
        }
    }
}

/// Volume percentage and mute flag, as last observed or computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixerState {
    pub volume: i64,
    pub muted: bool,
}

/// Persistence seam for mixer state.
///
/// Platform drivers save through this after every successful mutation or
/// state-refreshing query, and restore from it at construction time. A save
/// failure is reported to the driver, which logs it and carries on; it never
/// fails the mixer operation itself.
pub trait StateStore {
    fn load(&self) -> Option<MixerState>;
    fn save(&mut self, state: &MixerState) -> Result<(), MixerError>;
}

/// In-memory [`StateStore`], for tests and callers that opt out of
/// persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Option<MixerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MixerState) -> Self {
        Self { state: Some(state) }
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Option<MixerState> {
        self.state
    }

    fn save(&mut self, state: &MixerState) -> Result<(), MixerError> {
        self.state = Some(*state);
        Ok(())
    }
}

/// System volume control surface.
///
/// Volume operations return the resulting volume, mute operations the
/// resulting mute state. Drivers never surface external-command failures
/// through these methods; they log the failure and return the last known
/// in-memory value instead.
pub trait Mixer {
    /// Construction parameters this mixer was built with.
    fn settings(&self) -> &MixerSettings;

    /// Current in-memory state, without touching the OS.
    fn state(&self) -> MixerState;

    /// Current volume; platform drivers refresh from the OS first.
    fn volume(&mut self) -> i64;

    /// Set an absolute volume, clamped to `max_volume` unless
    /// `ignore_limits`.
    fn set_volume(&mut self, volume: i64, ignore_limits: bool) -> i64;

    /// Add a signed step to the current volume, then clamp as
    /// [`Mixer::set_volume`] does.
    fn change_volume(&mut self, step: i64, ignore_limits: bool) -> i64;

    /// Raise the volume by `step`, or by the configured `step_up` when
    /// `step` is zero. The step is always applied as a positive magnitude.
    fn volume_up(&mut self, step: i64) -> i64 {
        let magnitude = if step == 0 {
            self.settings().step_up
        } else {
            step
        };
        self.change_volume(magnitude.abs(), false)
    }

    /// Lower the volume by `step`, or by the configured `step_down` when
    /// `step` is zero.
    fn volume_down(&mut self, step: i64) -> i64 {
        let magnitude = if step == 0 {
            self.settings().step_down
        } else {
            step
        };
        self.change_volume(-magnitude.abs(), false)
    }

    /// Current mute state; refresh behavior is platform-specific.
    fn is_muted(&mut self) -> bool;

    /// Set the mute state explicitly.
    fn set_mute(&mut self, mute: bool) -> bool;

    /// Flip the mute state. Drivers override this where the platform offers
    /// a native toggle.
    fn toggle_mute(&mut self) -> bool {
        let next = !self.is_muted();
        self.set_mute(next)
    }
}

/// Build the volume driver for `platform`.
///
/// Unrecognized platforms get a [`SoftMixer`], which performs no external
/// process calls and does not persist.
pub fn create_mixer(
    platform: Platform,
    settings: MixerSettings,
    store: Box<dyn StateStore>,
) -> Box<dyn Mixer> {
    match platform {
        Platform::MacOs => Box::new(MacosMixer::new(settings, store)),
        Platform::Linux => Box::new(AlsaMixer::new(settings, store)),
        Platform::Unknown => {
            tracing::warn!("unsupported platform, volume changes stay in memory");
            Box::new(SoftMixer::new(settings))
        }
    }
}

/// In-memory mixer used on platforms without a driver.
///
/// Starts at half of `max_volume`, unmuted; all operations mutate local
/// state only.
pub struct SoftMixer {
    settings: MixerSettings,
    state: MixerState,
}

impl SoftMixer {
    pub fn new(settings: MixerSettings) -> Self {
        let state = MixerState {
            volume: settings.max_volume / 2,
            muted: false,
        };
        Self { settings, state }
    }
}

impl Mixer for SoftMixer {
    fn settings(&self) -> &MixerSettings {
        &self.settings
    }

    fn state(&self) -> MixerState {
        self.state
    }

    fn volume(&mut self) -> i64 {
        tracing::debug!("volume: {}", self.state.volume);
        self.state.volume
    }

    fn set_volume(&mut self, volume: i64, ignore_limits: bool) -> i64 {
        self.state.volume = if ignore_limits {
            volume
        } else {
            volume.min(self.settings.max_volume)
        };
        tracing::debug!("set_volume: {}", self.state.volume);
        self.state.volume
    }

    fn change_volume(&mut self, step: i64, ignore_limits: bool) -> i64 {
        tracing::debug!("change_volume: {}", step);
        let target = self.state.volume + step;
        self.set_volume(target, ignore_limits)
    }

    fn is_muted(&mut self) -> bool {
        tracing::debug!("is_muted: {}", self.state.muted);
        self.state.muted
    }

    fn set_mute(&mut self, mute: bool) -> bool {
        tracing::debug!("set_mute: {}", mute);
        self.state.muted = mute;
        self.state.muted
    }
}
