//! Facade configuration

use crate::audio::AudioSessionConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Player facade configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Interval of the periodic progress observer (milliseconds)
    pub progress_interval_ms: u64,
    /// Offset applied by seek forward/backward (milliseconds)
    pub seek_step_ms: u64,
    /// Peak bitrate cap applied when a session becomes ready (0 = no cap)
    ///
    /// Uncapped by default so the player picks from the whole ladder. A cap
    /// below every variant, such as 2304, pins playback to the lowest one.
    pub preferred_peak_bit_rate: f64,
    /// Register the host interruption observer per session
    pub observe_interruptions: bool,
    /// Register the access-log (bitrate) observer per session
    pub observe_access_log: bool,
    /// Applied once by the host at startup
    pub audio_session: AudioSessionConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 500,
            seek_step_ms: 15_000,
            preferred_peak_bit_rate: 0.0,
            observe_interruptions: true,
            observe_access_log: true,
            audio_session: AudioSessionConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlayerConfig =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.progress_interval_ms == 0 {
            return Err(Error::InvalidConfig("progress_interval_ms must be non-zero".into()));
        }
        if self.seek_step_ms == 0 {
            return Err(Error::InvalidConfig("seek_step_ms must be non-zero".into()));
        }
        validate_peak_bit_rate(self.preferred_peak_bit_rate)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn seek_step(&self) -> Duration {
        Duration::from_millis(self.seek_step_ms)
    }
}

pub(crate) fn validate_peak_bit_rate(bits_per_second: f64) -> Result<()> {
    if !bits_per_second.is_finite() || bits_per_second < 0.0 {
        return Err(Error::InvalidConfig(format!(
            "preferred peak bit rate must be finite and >= 0, got {}",
            bits_per_second
        )));
    }
    Ok(())
}
