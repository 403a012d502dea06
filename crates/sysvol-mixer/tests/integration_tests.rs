//! Integration tests for driver construction and platform dispatch

use sysvol_mixer::{
    create_mixer, list_devices, MemoryStore, Mixer, MixerSettings, MixerState, Platform,
    StateStore,
};

fn settings(max_volume: i64) -> MixerSettings {
    MixerSettings {
        device_name: "sysvol-missing-card".to_string(),
        mixer_name: "Master".to_string(),
        step_up: 5,
        step_down: 5,
        max_volume,
    }
}

#[test]
fn test_unknown_platform_gets_in_memory_mixer() {
    let mut mixer = create_mixer(
        Platform::Unknown,
        settings(100),
        Box::new(MemoryStore::new()),
    );

    // Pure in-memory semantics: starts at half the maximum, mutations apply
    // without any external process.
    assert_eq!(mixer.volume(), 50);
    assert_eq!(mixer.set_volume(30, false), 30);
    assert_eq!(mixer.set_volume(500, false), 100);
    assert!(!mixer.is_muted());
    assert!(mixer.toggle_mute());
    assert!(!mixer.toggle_mute());
}

#[test]
fn test_unknown_platform_has_empty_catalog() {
    assert!(list_devices(Platform::Unknown).is_empty());
}

#[test]
fn test_linux_driver_restores_persisted_state() {
    let state = MixerState {
        volume: 37,
        muted: true,
    };
    let mixer = create_mixer(
        Platform::Linux,
        settings(100),
        Box::new(MemoryStore::with_state(state)),
    );
    assert_eq!(mixer.state(), state);
}

#[test]
fn test_macos_driver_restores_persisted_state() {
    let state = MixerState {
        volume: 64,
        muted: false,
    };
    let mixer = create_mixer(
        Platform::MacOs,
        settings(100),
        Box::new(MemoryStore::with_state(state)),
    );
    assert_eq!(mixer.state(), state);
}

#[test]
fn test_drivers_start_from_zero_without_persisted_state() {
    let mixer = create_mixer(Platform::Linux, settings(100), Box::new(MemoryStore::new()));
    assert_eq!(mixer.state(), MixerState::default());
}

#[test]
fn test_volume_up_down_defaults_match_explicit_steps() {
    let settings = MixerSettings {
        step_up: 4,
        step_down: 6,
        ..MixerSettings::default()
    };

    let mut implicit = create_mixer(
        Platform::Unknown,
        settings.clone(),
        Box::new(MemoryStore::new()),
    );
    let mut explicit = create_mixer(Platform::Unknown, settings, Box::new(MemoryStore::new()));

    assert_eq!(implicit.volume_up(0), explicit.volume_up(4));
    assert_eq!(implicit.volume_down(0), explicit.volume_down(6));
}

#[test]
fn test_memory_store_sees_driver_saves() {
    // The store trait contract: what a driver saves must be what a later
    // driver restores.
    let mut store = MemoryStore::new();
    let state = MixerState {
        volume: 81,
        muted: false,
    };
    store.save(&state).unwrap();

    let mixer = create_mixer(Platform::Linux, settings(100), Box::new(store));
    assert_eq!(mixer.state(), state);
}
