//! TOML-backed persisted mixer state
//!
//! Drivers write through this after every successful mutation; a later
//! invocation restores from it at construction time. The file is read and
//! written without locking, so overlapping invocations resolve as
//! last-writer-wins.

use crate::{default_state_path, ConfigError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use sysvol_mixer::{MixerError, MixerState, StateStore};

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    last_volume: i64,
    last_muted: bool,
}

/// File-based [`StateStore`].
#[derive(Debug)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The state file in the user's config directory.
    pub fn at_default_location() -> Result<Self, ConfigError> {
        Ok(Self::new(default_state_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for StateFile {
    fn load(&self) -> Option<MixerState> {
        let contents = fs::read_to_string(&self.path).ok()?;
        let state: PersistedState = match toml::from_str(&contents) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!("ignoring malformed state file {}: {}", self.path.display(), err);
                return None;
            }
        };

        Some(MixerState {
            volume: state.last_volume,
            muted: state.last_muted,
        })
    }

    fn save(&mut self, state: &MixerState) -> Result<(), MixerError> {
        let persisted = PersistedState {
            last_volume: state.volume,
            last_muted: state.muted,
        };
        let contents =
            toml::to_string_pretty(&persisted).map_err(|err| MixerError::Store(err.to_string()))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
