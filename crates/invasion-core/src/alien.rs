use std::time::Duration;

use rand::Rng;

use crate::config::SimConfig;

/// Static profile of a single alien.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlienProfile {
    /// Unique alien ID.
    pub name: String,
    /// Fighting power; higher totals prolong city fights.
    pub power: u32,
    /// Interval between movement attempts.
    pub step_every: Duration,
    /// Lifetime movement budget.
    pub max_steps: u32,
}

impl AlienProfile {
    /// Generates `count` profiles with stats drawn from the configured
    /// ranges. Power and step interval are uniform in `[min, max)` and
    /// collapse to `min` when the range is empty.
    #[must_use]
    pub fn generate<R: Rng>(count: u32, config: &SimConfig, rng: &mut R) -> Vec<AlienProfile> {
        let (pwr_min, pwr_max) = (config.alien_min_power, config.alien_max_power);
        let (step_min, step_max) = (config.step_min_ms, config.step_max_ms);

        (0..count)
            .map(|id| {
                let power = if pwr_max > pwr_min {
                    rng.random_range(pwr_min..pwr_max)
                } else {
                    pwr_min
                };
                let step_ms = if step_max > step_min {
                    rng.random_range(step_min..step_max)
                } else {
                    step_min
                };
                AlienProfile {
                    name: format!("#{id:08}"),
                    power,
                    step_every: Duration::from_millis(step_ms),
                    max_steps: config.alien_max_steps,
                }
            })
            .collect()
    }
}
