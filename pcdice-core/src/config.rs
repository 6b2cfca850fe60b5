use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use pcdice_types::{MidiChannel, StepCount, Tempo};

use crate::engine::EngineSettings;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    bpm: Option<u16>,
    steps: Option<u8>,
    channel: Option<u8>,
    device: Option<String>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    device_poll_ms: Option<u64>,
    error_display_secs: Option<u64>,
    auto_select_first: Option<bool>,
}

pub struct Config {
    defaults: DefaultsConfig,
    runtime: RuntimeConfig,
}

impl Config {
    /// Embedded defaults, overlaid with the user's config file if present.
    pub fn load() -> Self {
        Self::load_from(user_config_path().as_deref())
    }

    pub fn load_from(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_runtime(&mut base.runtime, user.runtime);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            runtime: base.runtime,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let fallback = EngineSettings::default();
        EngineSettings {
            tempo: self.defaults.bpm.map(Tempo::new).unwrap_or(fallback.tempo),
            steps: self
                .defaults
                .steps
                .and_then(|s| {
                    let parsed = StepCount::from_steps(s);
                    if parsed.is_none() {
                        log::warn!(target: "config", "steps must be 16 or 32, got {}", s);
                    }
                    parsed
                })
                .unwrap_or(fallback.steps),
            channel: self
                .defaults
                .channel
                .map(MidiChannel::from_display)
                .unwrap_or(fallback.channel),
            error_display: self.error_display(),
        }
    }

    /// Preferred output name for startup selection.
    pub fn preferred_device(&self) -> Option<&str> {
        self.defaults.device.as_deref()
    }

    /// Output re-enumeration period (clamped to 100ms..10s).
    pub fn device_poll_interval(&self) -> Duration {
        let ms = self
            .runtime
            .device_poll_ms
            .unwrap_or(1000)
            .clamp(100, 10_000);
        Duration::from_millis(ms)
    }

    /// Send error banner lifetime (clamped to 1..60 seconds).
    pub fn error_display(&self) -> Duration {
        let secs = self.runtime.error_display_secs.unwrap_or(5).clamp(1, 60);
        Duration::from_secs(secs)
    }

    pub fn auto_select_first(&self) -> bool {
        self.runtime.auto_select_first.unwrap_or(true)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pcdice").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.steps.is_some() {
        base.steps = user.steps;
    }
    if user.channel.is_some() {
        base.channel = user.channel;
    }
    if user.device.is_some() {
        base.device = user.device;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.device_poll_ms.is_some() {
        base.device_poll_ms = user.device_poll_ms;
    }
    if user.error_display_secs.is_some() {
        base.error_display_secs = user.error_display_secs;
    }
    if user.auto_select_first.is_some() {
        base.auto_select_first = user.auto_select_first;
    }
}
