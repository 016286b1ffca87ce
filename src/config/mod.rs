//! Configuration for the decode/aggregate pipeline
//!
//! [`PipelineConfig`] collects the tunable constants of the core: liveness
//! ceiling, chart window sizes, sampler bound, and pool capacity. Hosts
//! embed a default config or load one from a JSON or TOML file.

use crate::error::{NetVisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Liveness ceiling in frames: 30 seconds at 60 Hz.
pub const DEFAULT_LIVENESS_CEILING: u32 = 1800;

/// Short moving-average window (samples).
pub const DEFAULT_SHORT_WINDOW: usize = 240;

/// Long moving-average window (samples).
pub const DEFAULT_LONG_WINDOW: usize = 300;

/// Maximum inverse sampling rate.
pub const DEFAULT_MAX_INV_SAMPLE_RATE: u32 = 16;

/// Broadcast pool hit-history capacity per class.
pub const DEFAULT_POOL_CAPACITY: usize = 32;

/// Tunable constants for [`EpochPipeline`](crate::pipeline::EpochPipeline).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Device liveness ceiling, in frames
    pub liveness_ceiling: u32,
    /// Short rate-chart window, in cycles
    pub short_window: usize,
    /// Long rate-chart window, in cycles
    pub long_window: usize,
    /// Upper bound for the inverse sampling rate; must be a power of two
    pub max_inv_sample_rate: u32,
    /// Per-class broadcast pool capacity
    pub pool_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            liveness_ceiling: DEFAULT_LIVENESS_CEILING,
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            max_inv_sample_rate: DEFAULT_MAX_INV_SAMPLE_RATE,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Validate invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if !self.max_inv_sample_rate.is_power_of_two() {
            return Err(NetVisError::Config(format!(
                "max_inv_sample_rate must be a power of two, got {}",
                self.max_inv_sample_rate
            )));
        }
        if self.short_window == 0 || self.long_window == 0 {
            return Err(NetVisError::Config(
                "chart windows must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load a config from a JSON or TOML file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            toml::from_str(&contents)
                .map_err(|e| NetVisError::Serialization(format!("invalid TOML config: {e}")))?
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| NetVisError::Serialization(format!("invalid JSON config: {e}")))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| NetVisError::Serialization(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
