//! World-side city state: the roster of co-located aliens and the fight
//! timer. Only the coordinator loop touches these cells.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{after, bounded, select, Sender};
use invasion_core::{AlienProfile, City};
use tracing::error;

use crate::cancel::CancelToken;
use crate::messages::{AlienEvent, WorldRequest};

/// Coordinator-side handle to a live alien: its profile plus the sender end
/// of its capacity-1 mailbox.
pub(crate) struct AlienHandle {
    pub(crate) profile: AlienProfile,
    pub(crate) mailbox: Sender<AlienEvent>,
}

/// Control handle for an armed fight timer. Dropping it disarms the timer;
/// sending a fresh duration prolongs the fight.
struct FightTimer {
    reset: Sender<Duration>,
}

/// A city at runtime: static data (roads mutable), alien roster, fight timer.
pub(crate) struct CityCell {
    city: City,
    roster: BTreeMap<String, AlienHandle>,
    fight: Option<FightTimer>,
    world_tx: Sender<WorldRequest>,
    cancel: CancelToken,
}

impl CityCell {
    pub(crate) fn new(city: City, world_tx: Sender<WorldRequest>, cancel: CancelToken) -> Self {
        Self {
            city,
            roster: BTreeMap::new(),
            fight: None,
            world_tx,
            cancel,
        }
    }

    pub(crate) fn city(&self) -> &City {
        &self.city
    }

    /// True while two or more aliens share the tile.
    pub(crate) fn at_fight(&self) -> bool {
        self.roster.len() > 1
    }

    /// Snapshot of the current roster, in name order.
    pub(crate) fn alien_ids(&self) -> Vec<String> {
        self.roster.keys().cloned().collect()
    }

    pub(crate) fn remove_roads_to(&mut self, city_id: &str) {
        self.city.remove_roads_to(city_id);
    }

    /// Inserts an alien and manages the fight timer. Returns true when a
    /// fight started or was prolonged by the arrival.
    ///
    /// The fight duration is `fight_coef × Σ power` over the current roster;
    /// a new combatant resets the countdown to the recomputed duration. A
    /// zero total makes the fight instantaneous.
    pub(crate) fn add_alien(&mut self, handle: AlienHandle, fight_coef: Duration) -> bool {
        self.roster.insert(handle.profile.name.clone(), handle);
        if self.roster.len() < 2 {
            return false;
        }

        let total_power = self
            .roster
            .values()
            .map(|handle| handle.profile.power)
            .fold(0u32, u32::saturating_add);
        let duration = fight_coef.saturating_mul(total_power);

        // Prolong the running fight. A failed send means the timer already
        // fired (destroy request in flight); re-arm, matching
        // reset-after-expiry timer semantics.
        let prolonged = match &self.fight {
            Some(timer) => timer.reset.send(duration).is_ok(),
            None => false,
        };
        if !prolonged {
            self.fight = Some(spawn_fight_timer(
                self.city.name().to_string(),
                duration,
                self.world_tx.clone(),
                self.cancel.clone(),
            ));
        }
        true
    }

    /// Removes an alien from the roster, returning its handle. The fight
    /// timer is left untouched; it is disarmed only when the cell is dropped.
    pub(crate) fn remove_alien(&mut self, alien_id: &str) -> Option<AlienHandle> {
        self.roster.remove(alien_id)
    }

    #[cfg(test)]
    pub(crate) fn fight_armed(&self) -> bool {
        self.fight.is_some()
    }
}

/// Runs the countdown on its own thread. Expiry sends a `CityDestroyed`
/// request; a reset restarts the countdown; a dropped control handle or
/// global cancellation stops the thread without firing.
fn spawn_fight_timer(
    city_id: String,
    duration: Duration,
    world_tx: Sender<WorldRequest>,
    cancel: CancelToken,
) -> FightTimer {
    let (reset_tx, reset_rx) = bounded::<Duration>(1);
    let thread_name = format!("fight-{city_id}");

    let spawned = thread::Builder::new().name(thread_name).spawn(move || {
        let mut duration = duration;
        loop {
            // A fresh deadline is armed on entry and after every reset.
            let deadline = after(duration);
            select! {
                recv(deadline) -> _ => {
                    let _ = world_tx.send(WorldRequest::CityDestroyed { city_id });
                    break;
                }
                recv(reset_rx) -> extension => match extension {
                    Ok(extended) => duration = extended,
                    Err(_) => break,
                },
                recv(cancel.done()) -> _ => break,
            }
        }
    });
    if let Err(err) = spawned {
        error!(?err, "failed to spawn fight timer thread");
    }

    FightTimer { reset: reset_tx }
}
