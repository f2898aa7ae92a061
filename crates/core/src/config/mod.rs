use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Result, TimelineError};

/// Top-level configuration structure for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub mapper: MapperConfig,
    #[serde(default)]
    pub synthetic: SyntheticConfig,
}

impl AppConfig {
    /// Parses a JSON document. Missing sections and fields fall back to
    /// their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.detector.validate()?;
        self.mapper.validate()?;
        self.synthetic.validate()
    }
}

/// Parameters of the energy-threshold onset detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Analysis window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: f64,
    /// Minimum normalised energy a window needs to count as a beat.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Required ratio between a window's energy and its predecessor's.
    #[serde(default = "default_sensitivity_ratio")]
    pub sensitivity_ratio: f32,
    /// Minimum number of windows between two accepted beats.
    #[serde(default = "default_min_beat_interval")]
    pub min_beat_interval_segments: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            threshold: default_threshold(),
            sensitivity_ratio: default_sensitivity_ratio(),
            min_beat_interval_segments: default_min_beat_interval(),
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.window_ms.is_finite() || self.window_ms <= 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "window_ms must be positive, got {}",
                self.window_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(TimelineError::InvalidConfig(format!(
                "threshold must lie in [0, 1], got {}",
                self.threshold
            )));
        }
        if !self.sensitivity_ratio.is_finite() || self.sensitivity_ratio < 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "sensitivity_ratio must be a non-negative number, got {}",
                self.sensitivity_ratio
            )));
        }
        Ok(())
    }
}

/// Parameters used when resolving playback positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Maximum distance, exclusive, for hover lookups to snap to a beat.
    #[serde(default = "default_tolerance")]
    pub tolerance_seconds: f64,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            tolerance_seconds: default_tolerance(),
        }
    }
}

impl MapperConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance_seconds.is_finite() || self.tolerance_seconds <= 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "tolerance_seconds must be positive, got {}",
                self.tolerance_seconds
            )));
        }
        Ok(())
    }
}

/// Settings for the synthetic beat generator used when no audio is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    #[serde(default = "default_bpm")]
    pub bpm: f64,
    /// Fixed seed for reproducible output. `None` draws a fresh seed.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            seed: None,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "bpm must be positive, got {}",
                self.bpm
            )));
        }
        Ok(())
    }
}

fn default_window_ms() -> f64 {
    100.0
}

fn default_threshold() -> f32 {
    0.3
}

fn default_sensitivity_ratio() -> f32 {
    1.2
}

fn default_min_beat_interval() -> usize {
    3
}

fn default_tolerance() -> f64 {
    2.0
}

fn default_bpm() -> f64 {
    120.0
}
