use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default relative change between consecutive rounds above which the
/// turntable is considered unstable.
pub const DEFAULT_RELATIVE_THRESHOLD: f64 = 0.08;

/// Default hold-off, in coarse sensor rounds, after a disturbance.
pub const DEFAULT_COOLDOWN_ROUNDS: u16 = 2;

/// Construction-time tuning of the release gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InhibitorConfig {
    /// Fraction of the new round duration the change must exceed to inhibit.
    pub relative_threshold: f64,
    /// Full coarse rounds ball release stays inhibited after a disturbance.
    pub cooldown_rounds: u16,
}

impl Default for InhibitorConfig {
    fn default() -> Self {
        Self {
            relative_threshold: DEFAULT_RELATIVE_THRESHOLD,
            cooldown_rounds: DEFAULT_COOLDOWN_ROUNDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("relative threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),
    #[error("relative threshold must not be negative, got {0}")]
    NegativeThreshold(f64),
    #[error("cooldown must last at least one round")]
    ZeroCooldown,
}

impl InhibitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.relative_threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(self.relative_threshold));
        }
        if self.relative_threshold < 0.0 {
            return Err(ConfigError::NegativeThreshold(self.relative_threshold));
        }
        if self.cooldown_rounds == 0 {
            return Err(ConfigError::ZeroCooldown);
        }
        Ok(())
    }
}
