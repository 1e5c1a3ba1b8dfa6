//! Concurrent invasion engine: the world coordinator, per-alien runners,
//! city fight timers, and the request/event protocol that binds them.
//!
//! One thread runs the coordinator loop; it is the sole writer of the
//! cities map and the alien location index. Each alien runs its own
//! thread, each armed fight its own countdown thread, and a pacer thread
//! feeds disembark requests. All of them talk to the coordinator through
//! bounded channels; nothing else is shared, so no locks are needed.

mod alien;
mod cancel;
mod city;
mod messages;
#[cfg(test)]
mod tests_support;
mod world;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver};
use invasion_core::{AlienProfile, CityMap, ConfigError, MapError, SimConfig};
use invasion_monitor::{NoopListener, WorldEventsListener};
use thiserror::Error;
use tracing::info;

pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use messages::{AlienEvent, AlienRequest, DismissReason, WorldRequest};

use world::World;

/// Construction errors: every one of these is fatal and no thread starts.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("city map is not defined (empty)")]
    EmptyCityMap,
    #[error("aliens are not defined (empty)")]
    NoAliens,
    #[error("validating city map: {0}")]
    Map(#[from] MapError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("spawning world thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A validated, not-yet-started simulation.
pub struct Simulation {
    city_map: CityMap,
    aliens: Vec<AlienProfile>,
    listener: Arc<dyn WorldEventsListener>,
    config: SimConfig,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("city_map", &self.city_map)
            .field("aliens", &self.aliens)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Validates all inputs and builds the engine. The listener defaults to
    /// [`NoopListener`]; see [`Simulation::with_listener`].
    pub fn new(
        city_map: CityMap,
        aliens: Vec<AlienProfile>,
        config: SimConfig,
    ) -> Result<Self, SimError> {
        config.validate()?;
        city_map.validate()?;
        if city_map.is_empty() {
            return Err(SimError::EmptyCityMap);
        }
        if aliens.is_empty() {
            return Err(SimError::NoAliens);
        }
        Ok(Self {
            city_map,
            aliens,
            listener: Arc::new(NoopListener),
            config,
        })
    }

    /// Replaces the event listener.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn WorldEventsListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Starts the coordinator loop and the disembark pacer.
    ///
    /// The returned handle carries the stop channel: it receives exactly one
    /// message when the simulation terminates naturally (≤1 alien or ≤1
    /// city) and merely disconnects when `cancel` fires first.
    pub fn start(self, cancel: CancelToken) -> Result<SimHandle, SimError> {
        let (stop_tx, stop_rx) = bounded(1);
        let world = World::new(&self.city_map, self.listener, &self.config, cancel);
        let cities = self.city_map.len();
        let fleet = self.aliens.len();
        let aliens = self.aliens;

        let thread = thread::Builder::new()
            .name("invasion-world".into())
            .spawn(move || world.run(aliens, stop_tx))?;
        info!(cities, aliens = fleet, "simulation engine started");

        Ok(SimHandle {
            stopped: stop_rx,
            world: Some(thread),
        })
    }
}

/// Running-engine guard returned by [`Simulation::start`].
pub struct SimHandle {
    stopped: Receiver<()>,
    world: Option<JoinHandle<()>>,
}

impl SimHandle {
    /// Channel signalling natural termination; select on it alongside your
    /// own cancellation.
    #[must_use]
    pub fn stopped(&self) -> &Receiver<()> {
        &self.stopped
    }

    /// Blocks until the coordinator thread exits.
    pub fn join(mut self) {
        if let Some(thread) = self.world.take() {
            let _ = thread.join();
        }
    }
}
