use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::command::DEFAULT_COMMAND_CAPACITY;
use crate::event::DEFAULT_LOG_CAPACITY;
use crate::mapping::Bank;
use crate::sequencer::{DEFAULT_BARS, DEFAULT_BPM};

/// Startup configuration. Every field has a default, so a config file only
/// needs the keys it changes. Out-of-range values are clamped by the
/// component that consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// Frames per audio block (commands are applied at block boundaries)
    pub block_size: usize,
    pub bpm: u16,
    pub pattern_bars: u8,
    /// Factory preset loaded at startup
    pub preset: usize,
    pub bank: Bank,
    pub overdub: bool,
    pub blend: bool,
    /// Playback events buffered between the audio and control domains
    pub event_queue_capacity: usize,
    pub command_capacity: usize,
    pub event_log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            block_size: 64,
            bpm: DEFAULT_BPM,
            pattern_bars: DEFAULT_BARS,
            preset: 0,
            bank: Bank::Synth,
            overdub: true,
            blend: true,
            event_queue_capacity: 64,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            event_log_capacity: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "bpm": 90, "bank": "Mix", "overdub": false }"#).unwrap();
        assert_eq!(config.bpm, 90);
        assert_eq!(config.bank, Bank::Mix);
        assert!(!config.overdub);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.event_queue_capacity, 64);
    }

    #[test]
    fn save_and_load() {
        let path = std::env::temp_dir().join(format!("groovebox-config-{}.json", std::process::id()));
        let config = EngineConfig {
            pattern_bars: 2,
            preset: 3,
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_an_error_with_context() {
        let err = EngineConfig::load(Path::new("/nonexistent/groovebox.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
