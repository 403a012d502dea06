//! macOS volume driver built on AppleScript
//!
//! Operations are rendered as small AppleScript snippets and run through
//! `osascript -e`. A mutation and the follow-up query are joined into one
//! compound script, so each operation costs a single process spawn. The
//! platform exposes one master volume, so there is no per-device or
//! per-control addressing beyond the scripting channel name.

use crate::devices::AudioDevice;
use crate::mixer::{Mixer, MixerSettings, MixerState, StateStore};
use crate::{shell, MixerError};

const OSASCRIPT: &str = "osascript";

/// AppleScript has no built-in numeric min; the handler is injected ahead
/// of relative changes so the script itself enforces the upper bound.
const MIN_HANDLER: &str =
    "on min(x, y)\n if x <= y\n return x\n else\n return y\n end if\n end min";

/// Volume driver for macOS.
pub struct MacosMixer {
    settings: MixerSettings,
    state: MixerState,
    store: Box<dyn StateStore>,
}

impl MacosMixer {
    /// Create the driver and restore the last persisted state.
    pub fn new(settings: MixerSettings, store: Box<dyn StateStore>) -> Self {
        let state = store.load().unwrap_or_default();
        Self {
            settings,
            state,
            store,
        }
    }

    /// The platform has a single master volume; report it as one synthetic
    /// device with no selectable controls.
    pub fn devices() -> Vec<AudioDevice> {
        vec![AudioDevice::new("output", "System Volume")]
    }

    fn volume_get(&self) -> String {
        format!(
            "{} volume of (get volume settings)",
            self.settings.device_name
        )
    }

    fn volume_set(&self, volume: i64) -> String {
        format!("set volume {} volume {}", self.settings.device_name, volume)
    }

    fn volume_change(&self, step: i64, ignore_limits: bool) -> String {
        let device = &self.settings.device_name;
        let sign = if step >= 0 { '+' } else { '-' };
        let magnitude = step.abs();
        if ignore_limits {
            format!(
                "set volume {device} volume (({device} volume of (get volume settings)){sign}{magnitude})"
            )
        } else {
            format!(
                "set volume {device} volume (my min({max}, ({device} volume of (get volume settings)){sign}{magnitude}))",
                max = self.settings.max_volume
            )
        }
    }

    fn mute_get(&self) -> String {
        format!(
            "{} muted of (get volume settings)",
            self.settings.device_name
        )
    }

    fn mute_set(&self, mute: bool) -> String {
        format!("set volume {} muted {}", self.settings.device_name, mute)
    }

    fn mute_toggle(&self) -> String {
        let device = &self.settings.device_name;
        format!("set volume {device} muted not ({device} muted of (get volume settings))")
    }

    /// Run a compound script and parse its last-line reply as a volume.
    fn run_volume_script(&self, lines: &[String]) -> Result<i64, MixerError> {
        let reply = shell::run(OSASCRIPT, &["-e", &lines.join("\n")])?;
        parse_volume(&reply)
    }

    /// Run a compound script and parse its reply as a mute flag.
    fn run_mute_script(&self, lines: &[String]) -> Result<bool, MixerError> {
        let reply = shell::run(OSASCRIPT, &["-e", &lines.join("\n")])?;
        Ok(parse_mute(&reply))
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.state) {
            tracing::warn!("failed to persist mixer state: {}", err);
        }
    }
}

impl Mixer for MacosMixer {
    fn settings(&self) -> &MixerSettings {
        &self.settings
    }

    fn state(&self) -> MixerState {
        self.state
    }

    fn volume(&mut self) -> i64 {
        match self.run_volume_script(&[self.volume_get()]) {
            Ok(volume) => {
                self.state.volume = volume;
                self.persist();
            }
            Err(err) => {
                tracing::warn!("volume query failed, using last known value: {}", err)
            }
        }
        tracing::debug!("volume: {}", self.state.volume);
        self.state.volume
    }

    fn set_volume(&mut self, volume: i64, ignore_limits: bool) -> i64 {
        self.state.volume = clamp(volume, self.settings.max_volume, ignore_limits);
        let script = [self.volume_set(self.state.volume), self.volume_get()];
        match self.run_volume_script(&script) {
            Ok(volume) => {
                self.state.volume = volume;
                self.persist();
            }
            Err(err) => {
                tracing::warn!("volume set failed, keeping {}: {}", self.state.volume, err)
            }
        }
        tracing::debug!("set_volume: {}", self.state.volume);
        self.state.volume
    }

    fn change_volume(&mut self, step: i64, ignore_limits: bool) -> i64 {
        let script = [
            MIN_HANDLER.to_string(),
            self.volume_change(step, ignore_limits),
            self.volume_get(),
        ];
        match self.run_volume_script(&script) {
            Ok(volume) => {
                self.state.volume = volume;
                // Setting a volume through the scripting interface also
                // unmutes the output.
                self.state.muted = false;
                self.persist();
            }
            Err(err) => {
                tracing::warn!("volume change failed, keeping {}: {}", self.state.volume, err)
            }
        }
        tracing::debug!("change_volume: {} ({})", self.state.volume, step);
        self.state.volume
    }

    fn is_muted(&mut self) -> bool {
        match self.run_mute_script(&[self.mute_get()]) {
            Ok(muted) => {
                self.state.muted = muted;
                self.persist();
            }
            Err(err) => {
                tracing::warn!("mute query failed, using last known value: {}", err)
            }
        }
        tracing::debug!("is_muted: {}", self.state.muted);
        self.state.muted
    }

    fn set_mute(&mut self, mute: bool) -> bool {
        let script = [self.mute_set(mute), self.mute_get()];
        match self.run_mute_script(&script) {
            Ok(muted) => {
                self.state.muted = muted;
                self.persist();
            }
            Err(err) => {
                tracing::warn!("mute set failed, keeping {}: {}", self.state.muted, err)
            }
        }
        tracing::debug!("set_mute: {}", self.state.muted);
        self.state.muted
    }

    fn toggle_mute(&mut self) -> bool {
        let script = [self.mute_toggle(), self.mute_get()];
        match self.run_mute_script(&script) {
            Ok(muted) => {
                self.state.muted = muted;
                self.persist();
            }
            Err(err) => {
                tracing::warn!("mute toggle failed, keeping {}: {}", self.state.muted, err)
            }
        }
        tracing::debug!("toggle_mute: {}", self.state.muted);
        self.state.muted
    }
}

/// macOS clamp: bound to `max_volume` unless limits are ignored. The OS
/// itself refuses to go below zero, so there is no lower clamp.
fn clamp(volume: i64, max_volume: i64, ignore_limits: bool) -> i64 {
    if ignore_limits {
        volume
    } else {
        volume.min(max_volume)
    }
}

fn parse_volume(reply: &str) -> Result<i64, MixerError> {
    let text = reply.trim();
    text.parse::<i64>()
        .map_err(|_| MixerError::Parse(format!("expected a volume number, got {:?}", text)))
}

/// osascript prints `true`/`false` for boolean expressions.
fn parse_mute(reply: &str) -> bool {
    reply.to_lowercase().contains("true")
}
