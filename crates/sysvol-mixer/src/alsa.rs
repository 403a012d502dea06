//! Linux volume driver built on the `amixer` utility
//!
//! Queries and mutations go through `amixer -c <card> get|set <control>`;
//! both answer with the same `Playback ... [N%] ... [on|off]` status block,
//! so every operation refreshes volume and mute together from one response.
//! Sound cards are discovered from the kernel's `/proc/asound/cards`
//! listing, controls per card via `amixer ... scontrols`.

use crate::devices::AudioDevice;
use crate::mixer::{Mixer, MixerSettings, MixerState, StateStore};
use crate::{shell, MixerError};
use regex::Regex;
use std::fs;

const AMIXER: &str = "amixer";
const CARDS_LISTING: &str = "/proc/asound/cards";

/// Card lines look like ` 0 [HDA            ]: HDA-Intel - HD-Audio`.
const CARD_PATTERN: &str = r"^.+\[(?P<key>.+)\]:\s*(?P<name>.+)$";

/// Control lines look like `Simple mixer control 'Master',0`.
const SCONTROL_PATTERN: &str = r"^.+\s'(?P<name>.+)',\d+$";

/// Status lines look like `  Front Left: Playback 75 [75%] [on]`.
const PLAYBACK_PATTERN: &str = r"^.+Playback\s+\d+\s+\[(?P<volume>[\d.+-]+)%\]\s+\[.+\]";

fn playback_pattern() -> Regex {
    Regex::new(PLAYBACK_PATTERN).expect("playback pattern is valid")
}

/// Volume driver for Linux/ALSA.
pub struct AlsaMixer {
    settings: MixerSettings,
    state: MixerState,
    store: Box<dyn StateStore>,
    playback: Regex,
}

impl AlsaMixer {
    /// Create the driver and restore the last persisted state.
    pub fn new(settings: MixerSettings, store: Box<dyn StateStore>) -> Self {
        let state = store.load().unwrap_or_default();
        Self {
            settings,
            state,
            store,
            playback: playback_pattern(),
        }
    }

    /// List sound cards and, per card, its selectable mixer controls.
    pub fn devices() -> Vec<AudioDevice> {
        let listing = match fs::read_to_string(CARDS_LISTING) {
            Ok(listing) => listing,
            Err(err) => {
                tracing::warn!("failed to read {}: {}", CARDS_LISTING, err);
                return Vec::new();
            }
        };

        let mut devices = parse_cards(&listing);
        for device in &mut devices {
            match shell::run(AMIXER, &["-c", &device.key, "scontrols"]) {
                Ok(response) => device.mixers = parse_scontrols(&response),
                Err(err) => {
                    tracing::warn!("failed to list controls for {}: {}", device.key, err)
                }
            }
        }
        devices
    }

    fn amixer_get(&mut self) -> Result<(), MixerError> {
        let response = shell::run(
            AMIXER,
            &[
                "-c",
                &self.settings.device_name,
                "get",
                &self.settings.mixer_name,
            ],
        )?;
        self.apply_response(&response)
    }

    fn amixer_set(&mut self, value: &str) -> Result<(), MixerError> {
        let response = shell::run(
            AMIXER,
            &[
                "-c",
                &self.settings.device_name,
                "set",
                &self.settings.mixer_name,
                value,
            ],
        )?;
        self.apply_response(&response)
    }

    /// Adopt the state reported in an amixer response and persist it.
    fn apply_response(&mut self, response: &str) -> Result<(), MixerError> {
        let line = parse_playback(&self.playback, response).ok_or_else(|| {
            MixerError::Parse("no Playback status line in amixer output".into())
        })?;

        self.state.volume = line.volume;
        if let Some(muted) = line.muted {
            self.state.muted = muted;
        }
        self.persist();
        Ok(())
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.state) {
            tracing::warn!("failed to persist mixer state: {}", err);
        }
    }
}

impl Mixer for AlsaMixer {
    fn settings(&self) -> &MixerSettings {
        &self.settings
    }

    fn state(&self) -> MixerState {
        self.state
    }

    fn volume(&mut self) -> i64 {
        if let Err(err) = self.amixer_get() {
            tracing::warn!("volume query failed, using last known value: {}", err);
        }
        tracing::debug!("volume: {}", self.state.volume);
        self.state.volume
    }

    fn set_volume(&mut self, volume: i64, ignore_limits: bool) -> i64 {
        self.state.volume = clamp(volume, self.settings.max_volume, ignore_limits);
        let value = format!("{}%", self.state.volume);
        if let Err(err) = self.amixer_set(&value) {
            tracing::warn!("volume set failed, keeping {}: {}", self.state.volume, err);
        }
        tracing::debug!("set_volume: {}", self.state.volume);
        self.state.volume
    }

    fn change_volume(&mut self, step: i64, ignore_limits: bool) -> i64 {
        // amixer's relative steps saturate at the hardware range, not at a
        // configured maximum; an over-the-limit step becomes an absolute set.
        if !ignore_limits && self.state.volume + step > self.settings.max_volume {
            return self.set_volume(self.settings.max_volume, ignore_limits);
        }

        let sign = if step >= 0 { '+' } else { '-' };
        let value = format!("{}%{}", step.abs(), sign);
        if let Err(err) = self.amixer_set(&value) {
            tracing::warn!("volume change failed, keeping {}: {}", self.state.volume, err);
        }
        tracing::debug!("change_volume: {} ({})", self.state.volume, step);
        self.state.volume
    }

    fn is_muted(&mut self) -> bool {
        // Volume and mute share one status line, so a mute query is a full
        // state refresh.
        if let Err(err) = self.amixer_get() {
            tracing::warn!("mute query failed, using last known value: {}", err);
        }
        tracing::debug!("is_muted: {}", self.state.muted);
        self.state.muted
    }

    fn set_mute(&mut self, mute: bool) -> bool {
        let value = if mute { "off" } else { "on" };
        if let Err(err) = self.amixer_set(value) {
            tracing::warn!("mute set failed, keeping {}: {}", self.state.muted, err);
        }
        tracing::debug!("set_mute: {}", self.state.muted);
        self.state.muted
    }

    fn toggle_mute(&mut self) -> bool {
        // amixer understands `toggle` directly; no prior state read needed.
        if let Err(err) = self.amixer_set("toggle") {
            tracing::warn!("mute toggle failed, keeping {}: {}", self.state.muted, err);
        }
        tracing::debug!("toggle_mute: {}", self.state.muted);
        self.state.muted
    }
}

/// ALSA clamp: bound to `max_volume` unless limits are ignored, then take
/// the absolute value so the volume never goes negative.
fn clamp(volume: i64, max_volume: i64, ignore_limits: bool) -> i64 {
    let bounded = if ignore_limits {
        volume
    } else {
        volume.min(max_volume)
    };
    bounded.abs()
}

/// Volume and mute as reported by one amixer status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlaybackLine {
    volume: i64,
    /// `None` when the line carries no `[on]`/`[off]` marker; the caller
    /// leaves the mute state unchanged.
    muted: Option<bool>,
}

/// Find the first Playback status line in an amixer response.
fn parse_playback(pattern: &Regex, response: &str) -> Option<PlaybackLine> {
    for line in response.lines() {
        let Some(caps) = pattern.captures(line) else {
            continue;
        };
        let Ok(volume) = caps["volume"].parse::<f64>() else {
            continue;
        };

        let muted = if line.contains("[off]") {
            Some(true)
        } else if line.contains("[on]") {
            Some(false)
        } else {
            None
        };

        return Some(PlaybackLine {
            volume: volume as i64,
            muted,
        });
    }
    None
}

/// Parse the kernel's sound-card listing into a device catalog.
fn parse_cards(listing: &str) -> Vec<AudioDevice> {
    let pattern = Regex::new(CARD_PATTERN).expect("card pattern is valid");
    listing
        .lines()
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            Some(AudioDevice::new(
                caps["key"].trim(),
                caps["name"].trim(),
            ))
        })
        .collect()
}

/// Parse an `amixer ... scontrols` listing into control names.
fn parse_scontrols(listing: &str) -> Vec<String> {
    let pattern = Regex::new(SCONTROL_PATTERN).expect("scontrol pattern is valid");
    listing
        .lines()
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            Some(caps["name"].to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::MemoryStore;

    /// A card id no machine has, so every amixer call degrades the same way
    /// whether or not ALSA is present.
    fn test_mixer(max_volume: i64) -> AlsaMixer {
        AlsaMixer::new(
            MixerSettings {
                device_name: "sysvol-missing-card".to_string(),
                mixer_name: "Master".to_string(),
                max_volume,
                ..MixerSettings::default()
            },
            Box::new(MemoryStore::new()),
        )
    }

    #[test]
    fn test_parse_cards_listing() {
        let devices = parse_cards(" 0 [HDA]: HDA-Intel - HD-Audio");
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].key, "HDA");
        assert_eq!(devices[0].name, "HDA-Intel - HD-Audio");
    }

    #[test]
    fn test_parse_cards_trims_padded_keys() {
        let listing = concat!(
            " 0 [PCH            ]: HDA-Intel - HDA Intel PCH\n",
            "                      HDA Intel PCH at 0xf7f30000 irq 31\n",
            " 1 [USB            ]: USB-Audio - Webcam\n",
        );
        let devices = parse_cards(listing);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].key, "PCH");
        assert_eq!(devices[0].name, "HDA-Intel - HDA Intel PCH");
        assert_eq!(devices[1].key, "USB");
    }

    #[test]
    fn test_parse_scontrols_listing() {
        let listing = "Simple mixer control 'Master',0\n\
                       Simple mixer control 'Headphone',0\n\
                       Simple mixer control 'PCM',1";
        let controls = parse_scontrols(listing);
        assert_eq!(controls, vec!["Master", "Headphone", "PCM"]);
    }

    #[test]
    fn test_parse_playback_volume_and_unmuted() {
        let pattern = playback_pattern();
        let response = "Simple mixer control 'Master',0\n  Front Left: Playback 75 [75%] [on]";
        let line = parse_playback(&pattern, response).unwrap();
        assert_eq!(line.volume, 75);
        assert_eq!(line.muted, Some(false));
    }

    #[test]
    fn test_parse_playback_muted() {
        let pattern = playback_pattern();
        let response = "Simple mixer control 'Master',0\n  Front Left: Playback 75 [75%] [off]";
        let line = parse_playback(&pattern, response).unwrap();
        assert_eq!(line.volume, 75);
        assert_eq!(line.muted, Some(true));
    }

    #[test]
    fn test_parse_playback_with_db_column() {
        let pattern = playback_pattern();
        let response = "  Front Left: Playback 48 [75%] [-12.00dB] [on]";
        let line = parse_playback(&pattern, response).unwrap();
        assert_eq!(line.volume, 75);
        assert_eq!(line.muted, Some(false));
    }

    #[test]
    fn test_parse_playback_first_matching_line_wins() {
        let pattern = playback_pattern();
        let response = concat!(
            "  Front Left: Playback 30 [30%] [on]\n",
            "  Front Right: Playback 90 [90%] [off]\n",
        );
        let line = parse_playback(&pattern, response).unwrap();
        assert_eq!(line.volume, 30);
        assert_eq!(line.muted, Some(false));
    }

    #[test]
    fn test_parse_playback_no_match() {
        let pattern = playback_pattern();
        assert!(parse_playback(&pattern, "amixer: Unable to find simple control").is_none());
        assert!(parse_playback(&pattern, "").is_none());
    }

    #[test]
    fn test_clamp_is_abs_of_min() {
        assert_eq!(clamp(150, 100, false), 100);
        assert_eq!(clamp(30, 100, false), 30);
        assert_eq!(clamp(-10, 100, false), 10);
        assert_eq!(clamp(150, 100, true), 150);
        assert_eq!(clamp(-10, 100, true), 10);
    }

    #[test]
    fn test_set_volume_keeps_clamped_value_on_command_failure() {
        let mut mixer = test_mixer(100);
        assert_eq!(mixer.set_volume(150, false), 100);
        assert_eq!(mixer.set_volume(-20, false), 20);
    }

    #[test]
    fn test_change_volume_saturates_exactly_at_max() {
        let mut mixer = test_mixer(100);
        mixer.set_volume(95, false);
        assert_eq!(mixer.change_volume(20, false), 100);
    }

    #[test]
    fn test_state_restored_from_store() {
        let state = MixerState {
            volume: 33,
            muted: true,
        };
        let mixer = AlsaMixer::new(
            MixerSettings::default(),
            Box::new(MemoryStore::with_state(state)),
        );
        assert_eq!(mixer.state(), state);
    }
}
