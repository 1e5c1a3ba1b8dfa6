//! Listener contract for world events, plus the stock implementations.
//!
//! The engine invokes these callbacks from its coordinator loop; a slow
//! listener throttles the simulation but cannot corrupt it, so
//! implementations should return quickly.

use invasion_core::City;
use tracing::info;

/// External consumer of world, city, and alien events.
pub trait WorldEventsListener: Send + Sync {
    /// A city's connection roads changed (a neighbor was destroyed).
    fn city_updated(&self, city: &City);

    /// A fight started or was prolonged in a city.
    fn city_fight_started(&self, city_id: &str);

    /// A city was destroyed, taking `alien_ids` with it.
    fn city_destroyed(&self, city_id: &str, alien_ids: &[String]);

    /// An alien moved to a new city (including its initial landing).
    fn alien_relocated(&self, alien_id: &str, new_city_id: &str);

    /// An alien left the simulation (`evacuated` or `destroyed`).
    fn alien_dismissed(&self, alien_id: &str, reason: &str);

    /// Periodic population report; `stopped` marks the final one.
    fn sim_status(&self, aliens: usize, cities: usize, stopped: bool);
}

/// Listener that swallows every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl WorldEventsListener for NoopListener {
    fn city_updated(&self, _city: &City) {}
    fn city_fight_started(&self, _city_id: &str) {}
    fn city_destroyed(&self, _city_id: &str, _alien_ids: &[String]) {}
    fn alien_relocated(&self, _alien_id: &str, _new_city_id: &str) {}
    fn alien_dismissed(&self, _alien_id: &str, _reason: &str) {}
    fn sim_status(&self, _aliens: usize, _cities: usize, _stopped: bool) {}
}

/// Listener that narrates every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl WorldEventsListener for LogListener {
    fn city_updated(&self, city: &City) {
        info!(city = %city.name(), roads = ?city.available_roads(), "city roads updated");
    }

    fn city_fight_started(&self, city_id: &str) {
        info!(city = %city_id, "fight started");
    }

    fn city_destroyed(&self, city_id: &str, alien_ids: &[String]) {
        info!(city = %city_id, aliens = ?alien_ids, "city destroyed");
    }

    fn alien_relocated(&self, alien_id: &str, new_city_id: &str) {
        info!(alien = %alien_id, city = %new_city_id, "alien relocated");
    }

    fn alien_dismissed(&self, alien_id: &str, reason: &str) {
        info!(alien = %alien_id, reason = %reason, "alien dismissed");
    }

    fn sim_status(&self, aliens: usize, cities: usize, stopped: bool) {
        info!(aliens, cities, stopped, "simulation status");
    }
}
