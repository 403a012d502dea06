//! Configuration management for sysvol
//!
//! Settings live in a TOML file under the user's config directory and cover
//! the mixer addressing (device and control names), step sizes, the volume
//! ceiling, and feedback behavior. Runtime mixer state is persisted
//! separately; see [`StateFile`].

mod state_file;

pub use state_file::StateFile;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysvol_mixer::MixerSettings;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config directory available on this system")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.toml";

/// User-facing settings, one TOML table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Audio device to control (ALSA card id; `output` on macOS).
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Mixer control on that device. Ignored on macOS.
    #[serde(default = "default_mixer_name")]
    pub mixer_name: String,

    /// Default step for `sysvol up`.
    #[serde(default = "default_step")]
    pub step_up: i64,

    /// Default step for `sysvol down`.
    #[serde(default = "default_step")]
    pub step_down: i64,

    /// Volume ceiling enforced by the mixer.
    #[serde(default = "default_max_volume")]
    pub max_volume: i64,

    /// Print a volume meter after every mutating command.
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// How long the meter stays on screen, in milliseconds.
    #[serde(default = "default_progress_time")]
    pub progress_time: u64,

    /// Enable debug logging regardless of `--verbose`.
    #[serde(default)]
    pub debug: bool,
}

fn default_device_name() -> String {
    "default".to_string()
}

fn default_mixer_name() -> String {
    "Master".to_string()
}

fn default_step() -> i64 {
    5
}

fn default_max_volume() -> i64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_progress_time() -> u64 {
    1000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            mixer_name: default_mixer_name(),
            step_up: default_step(),
            step_down: default_step(),
            max_volume: default_max_volume(),
            show_progress: true,
            progress_time: default_progress_time(),
            debug: false,
        }
    }
}

impl Settings {
    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&contents)?;
        Ok(settings)
    }

    /// Load settings from the default location, falling back to defaults
    /// when no file exists yet.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = default_config_path()?;
        if path.exists() {
            return Self::load(&path);
        }

        tracing::debug!("no configuration file at {}, using defaults", path.display());
        Ok(Self::default())
    }

    /// Save settings to a file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        tracing::info!("configuration saved to {}", path.display());
        Ok(())
    }

    /// Save to the default location.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        self.save(&default_config_path()?)
    }

    /// The mixer construction parameters these settings describe.
    pub fn mixer_settings(&self) -> MixerSettings {
        MixerSettings {
            device_name: self.device_name.clone(),
            mixer_name: self.mixer_name.clone(),
            step_up: self.step_up,
            step_down: self.step_down,
            max_volume: self.max_volume,
        }
    }
}

/// The per-user config directory for sysvol.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("org", "sysvol", "sysvol").ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().to_path_buf())
}

/// Default path of the settings file.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Default path of the persisted-state file.
pub fn default_state_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(STATE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.device_name, "default");
        assert_eq!(settings.mixer_name, "Master");
        assert_eq!(settings.step_up, 5);
        assert_eq!(settings.max_volume, 100);
        assert!(settings.show_progress);
        assert!(!settings.debug);
    }

    #[test]
    fn test_serialize_deserialize() {
        let settings = Settings::default();
        let toml_str = toml::to_string(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(settings.device_name, parsed.device_name);
        assert_eq!(settings.max_volume, parsed.max_volume);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Settings = toml::from_str("device_name = \"PCH\"\nstep_up = 10\n").unwrap();
        assert_eq!(parsed.device_name, "PCH");
        assert_eq!(parsed.step_up, 10);
        // Everything not in the file keeps its default.
        assert_eq!(parsed.step_down, 5);
        assert_eq!(parsed.mixer_name, "Master");
        assert_eq!(parsed.progress_time, 1000);
    }

    #[test]
    fn test_load_settings_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "device_name = \"HDA\"\nmixer_name = \"PCM\"\nmax_volume = 80\n"
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.device_name, "HDA");
        assert_eq!(settings.mixer_name, "PCM");
        assert_eq!(settings.max_volume, 80);
    }

    #[test]
    fn test_save_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let mut settings = Settings::default();
        settings.device_name = "USB".to_string();
        settings.show_progress = false;

        settings.save(file.path()).unwrap();

        let loaded = Settings::load(file.path()).unwrap();
        assert_eq!(loaded.device_name, "USB");
        assert!(!loaded.show_progress);
    }

    #[test]
    fn test_mixer_settings_conversion() {
        let mut settings = Settings::default();
        settings.step_down = 3;
        settings.max_volume = 90;

        let mixer = settings.mixer_settings();
        assert_eq!(mixer.device_name, settings.device_name);
        assert_eq!(mixer.step_down, 3);
        assert_eq!(mixer.max_volume, 90);
    }
}
