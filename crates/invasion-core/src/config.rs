use std::time::Duration;

use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error raised before the engine is constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Simulation tuning knobs. Duration-valued keys are stored in milliseconds
/// so the struct round-trips through TOML without custom codecs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimConfig {
    /// Minimum delay before an alien disembarks.
    pub disembark_min_ms: u64,
    /// Maximum delay before an alien disembarks.
    pub disembark_max_ms: u64,
    /// How often the world evaluates its stop conditions.
    pub stop_check_ms: u64,
    /// Fight duration per point of total alien power.
    pub fight_coef_ms: u64,
    /// Minimum alien step interval.
    pub step_min_ms: u64,
    /// Maximum alien step interval.
    pub step_max_ms: u64,
    /// Per-alien lifetime step budget.
    pub alien_max_steps: u32,
    /// Minimum generated fighting power.
    pub alien_min_power: u32,
    /// Maximum generated fighting power.
    pub alien_max_power: u32,
    /// Optional RNG seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            disembark_min_ms: 250,
            disembark_max_ms: 500,
            stop_check_ms: 1_000,
            fight_coef_ms: 150,
            step_min_ms: 500,
            step_max_ms: 1_000,
            alien_max_steps: 25,
            alien_min_power: 0,
            alien_max_power: 10,
            rng_seed: None,
        }
    }
}

impl SimConfig {
    /// Validates every value range; the engine refuses to start otherwise.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.disembark_max_ms < self.disembark_min_ms {
            return Err(ConfigError::Invalid(
                "disembark_max_ms must be >= disembark_min_ms",
            ));
        }
        if self.stop_check_ms == 0 {
            return Err(ConfigError::Invalid("stop_check_ms must be positive"));
        }
        if self.step_min_ms == 0 || self.step_max_ms == 0 {
            return Err(ConfigError::Invalid("step intervals must be positive"));
        }
        if self.step_max_ms < self.step_min_ms {
            return Err(ConfigError::Invalid("step_max_ms must be >= step_min_ms"));
        }
        if self.alien_max_steps == 0 {
            return Err(ConfigError::Invalid("alien_max_steps must be positive"));
        }
        if self.alien_max_power < self.alien_min_power {
            return Err(ConfigError::Invalid(
                "alien_max_power must be >= alien_min_power",
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn disembark_min(&self) -> Duration {
        Duration::from_millis(self.disembark_min_ms)
    }

    #[must_use]
    pub const fn disembark_max(&self) -> Duration {
        Duration::from_millis(self.disembark_max_ms)
    }

    #[must_use]
    pub const fn stop_check(&self) -> Duration {
        Duration::from_millis(self.stop_check_ms)
    }

    #[must_use]
    pub const fn fight_coef(&self) -> Duration {
        Duration::from_millis(self.fight_coef_ms)
    }

    #[must_use]
    pub const fn step_min(&self) -> Duration {
        Duration::from_millis(self.step_min_ms)
    }

    #[must_use]
    pub const fn step_max(&self) -> Duration {
        Duration::from_millis(self.step_max_ms)
    }

    /// Returns the configured RNG, seeding from entropy when no seed is set.
    #[must_use]
    pub fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::seed_from_u64(rand::random()),
        }
    }
}
