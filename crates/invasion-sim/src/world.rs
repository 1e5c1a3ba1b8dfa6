//! The world coordinator: single-writer authority over the cities map and
//! the alien location index.
//!
//! Every mutation happens inside the coordinator loop, serialized over two
//! bounded request channels. Aliens, fight timers, and the disembark pacer
//! never touch shared state; they only send requests. Lookups that fail
//! here are normal races (an alien dismissed mid-flight, a city destroyed
//! before a landing) and are dropped silently.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use invasion_core::{AlienProfile, CityMap, SimConfig};
use invasion_monitor::WorldEventsListener;
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::alien::AlienRunner;
use crate::cancel::CancelToken;
use crate::city::{AlienHandle, CityCell};
use crate::messages::{AlienEvent, AlienRequest, DismissReason, WorldRequest};

const REQUEST_CHANNEL_SIZE: usize = 100;

pub(crate) struct World {
    cities: BTreeMap<String, CityCell>,
    alien_city: BTreeMap<String, String>,
    listener: Arc<dyn WorldEventsListener>,

    alien_tx: Sender<AlienRequest>,
    alien_rx: Receiver<AlienRequest>,
    world_tx: Sender<WorldRequest>,
    world_rx: Receiver<WorldRequest>,

    fight_coef: Duration,
    stop_check: Duration,
    disembark_min: Duration,
    disembark_max: Duration,
    rng: SmallRng,
    cancel: CancelToken,
}

impl World {
    pub(crate) fn new(
        city_map: &CityMap,
        listener: Arc<dyn WorldEventsListener>,
        config: &SimConfig,
        cancel: CancelToken,
    ) -> Self {
        let (alien_tx, alien_rx) = bounded(REQUEST_CHANNEL_SIZE);
        let (world_tx, world_rx) = bounded(REQUEST_CHANNEL_SIZE);

        let cities = city_map
            .cities()
            .map(|city| {
                (
                    city.name().to_string(),
                    CityCell::new(city.clone(), world_tx.clone(), cancel.clone()),
                )
            })
            .collect();

        Self {
            cities,
            alien_city: BTreeMap::new(),
            listener,
            alien_tx,
            alien_rx,
            world_tx,
            world_rx,
            fight_coef: config.fight_coef(),
            stop_check: config.stop_check(),
            disembark_min: config.disembark_min(),
            disembark_max: config.disembark_max(),
            rng: config.seeded_rng(),
            cancel,
        }
    }

    /// The coordinator loop. Sends one message on `stop_tx` and returns on
    /// natural termination; returns without sending when cancelled.
    pub(crate) fn run(mut self, aliens: Vec<AlienProfile>, stop_tx: Sender<()>) {
        let city_ids = self.cities.keys().cloned().collect();
        self.spawn_pacer(city_ids, aliens);

        // Local handles so the select arms are free to mutate the state.
        let cancel = self.cancel.clone();
        let alien_rx = self.alien_rx.clone();
        let world_rx = self.world_rx.clone();
        let stop_ticker = tick(self.stop_check);

        loop {
            select! {
                recv(cancel.done()) -> _ => {
                    info!("world loop cancelled");
                    break;
                }
                recv(stop_ticker) -> _ => {
                    if self.check_stop_conditions() {
                        let _ = stop_tx.send(());
                        break;
                    }
                }
                recv(alien_rx) -> request => match request {
                    Ok(AlienRequest::Move { alien_id, city_id }) => {
                        self.handle_move(&alien_id, &city_id);
                    }
                    Ok(AlienRequest::Evacuate { alien_id }) => {
                        self.dismiss_alien(&alien_id, DismissReason::Evacuated);
                    }
                    Err(_) => break,
                },
                recv(world_rx) -> request => match request {
                    Ok(WorldRequest::Disembark { alien, city_id }) => {
                        self.handle_disembark(alien, &city_id);
                    }
                    Ok(WorldRequest::CityDestroyed { city_id }) => {
                        self.handle_city_destroyed(&city_id);
                    }
                    Err(_) => break,
                },
            }
        }
    }

    /// Drops aliens onto the initial city snapshot at a randomized pace.
    /// Not every alien lands; its target may be gone by then (it happens).
    fn spawn_pacer(&mut self, city_ids: Vec<String>, aliens: Vec<AlienProfile>) {
        let world_tx = self.world_tx.clone();
        let cancel = self.cancel.clone();
        let (min, max) = (self.disembark_min, self.disembark_max);
        let span_ms = max.saturating_sub(min).as_millis() as u64;
        let mut rng = SmallRng::seed_from_u64(self.rng.random());

        let spawned = thread::Builder::new()
            .name("invasion-pacer".into())
            .spawn(move || {
                for alien in aliens {
                    let mut delay = min;
                    if span_ms > 0 {
                        delay += Duration::from_millis(rng.random_range(0..span_ms));
                    }
                    if !delay.is_zero() && cancel.wait(delay) {
                        return;
                    }

                    let city_id = city_ids[rng.random_range(0..city_ids.len())].clone();
                    let request = WorldRequest::Disembark { alien, city_id };
                    if world_tx.send(request).is_err() {
                        return;
                    }
                }
            });
        if let Err(err) = spawned {
            error!(?err, "failed to spawn disembark pacer thread");
        }
    }

    /// Stop when at most one alien or at most one city remains. The status
    /// notification fires on every check, stopped or not.
    fn check_stop_conditions(&self) -> bool {
        let (aliens, cities) = (self.alien_city.len(), self.cities.len());
        let stop = aliens <= 1 || cities <= 1;
        self.listener.sim_status(aliens, cities, stop);
        if stop {
            info!(aliens, cities, "simulation stopped");
        }
        stop
    }

    fn handle_disembark(&mut self, alien: AlienProfile, city_id: &str) {
        let Some(cell) = self.cities.get(city_id) else {
            warn!(alien = %alien.name, city = %city_id, "disembark failed: city not found");
            return;
        };
        let start_location = cell.city().clone();

        let (mailbox_tx, mailbox_rx) = bounded(1);
        let handle = AlienHandle {
            profile: alien.clone(),
            mailbox: mailbox_tx,
        };
        self.place_alien(handle, city_id);

        AlienRunner::spawn(
            alien,
            start_location,
            mailbox_rx,
            self.alien_tx.clone(),
            self.rng.random(),
            self.cancel.clone(),
        );
    }

    fn handle_move(&mut self, alien_id: &str, new_city_id: &str) {
        let Some(old_city_id) = self.alien_city.get(alien_id).cloned() else {
            return;
        };
        if !self.cities.contains_key(new_city_id) {
            return;
        }
        let Some(old_cell) = self.cities.get_mut(&old_city_id) else {
            return;
        };
        // An alien cannot escape an ongoing fight.
        if old_cell.at_fight() {
            return;
        }
        let Some(handle) = old_cell.remove_alien(alien_id) else {
            return;
        };
        self.place_alien(handle, new_city_id);
    }

    /// Commits an alien into a city: updates the index, manages the roster
    /// and fight timer, confirms to the alien, and notifies the listener.
    fn place_alien(&mut self, handle: AlienHandle, city_id: &str) {
        let Some(cell) = self.cities.get_mut(city_id) else {
            return;
        };
        let alien_id = handle.profile.name.clone();
        let mailbox = handle.mailbox.clone();

        self.alien_city
            .insert(alien_id.clone(), city_id.to_string());
        let fight = cell.add_alien(handle, self.fight_coef);
        let location = cell.city().clone();

        // The runner drops its receiver on exit, so this cannot wedge.
        let _ = mailbox.send(AlienEvent::Relocated {
            alien_id: alien_id.clone(),
            location,
        });

        self.listener.alien_relocated(&alien_id, city_id);
        if fight {
            self.listener.city_fight_started(city_id);
        }
    }

    fn dismiss_alien(&mut self, alien_id: &str, reason: DismissReason) {
        let Some(city_id) = self.alien_city.get(alien_id).cloned() else {
            return;
        };
        let Some(cell) = self.cities.get_mut(&city_id) else {
            return;
        };
        let Some(handle) = cell.remove_alien(alien_id) else {
            return;
        };

        let _ = handle.mailbox.send(AlienEvent::Dismissed {
            alien_id: alien_id.to_string(),
            reason,
        });
        self.alien_city.remove(alien_id);
        self.listener.alien_dismissed(alien_id, reason.as_str());
    }

    fn handle_city_destroyed(&mut self, city_id: &str) {
        let Some(cell) = self.cities.get(city_id) else {
            return;
        };
        let neighbors: Vec<String> = cell
            .city()
            .neighbors()
            .map(|(_, target)| target.to_string())
            .collect();
        let aliens_involved = cell.alien_ids();

        for neighbor_id in neighbors {
            let Some(neighbor) = self.cities.get_mut(&neighbor_id) else {
                continue;
            };
            neighbor.remove_roads_to(city_id);
            self.listener.city_updated(neighbor.city());
        }

        for alien_id in &aliens_involved {
            self.dismiss_alien(alien_id, DismissReason::Destroyed);
        }

        // Dropping the cell disarms any armed fight timer.
        self.cities.remove(city_id);

        info!(city = %city_id, aliens = ?aliens_involved, "city destroyed");
        self.listener.city_destroyed(city_id, &aliens_involved);
    }

    #[cfg(test)]
    fn alien_location(&self, alien_id: &str) -> Option<&str> {
        self.alien_city.get(alien_id).map(String::as_str)
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        for (alien_id, city_id) in &self.alien_city {
            let cell = self
                .cities
                .get(city_id)
                .unwrap_or_else(|| panic!("alien {alien_id} indexed at missing city {city_id}"));
            assert!(
                cell.alien_ids().contains(alien_id),
                "alien {alien_id} missing from roster of {city_id}"
            );
            let elsewhere = self
                .cities
                .iter()
                .filter(|(name, _)| *name != city_id)
                .any(|(_, other)| other.alien_ids().contains(alien_id));
            assert!(!elsewhere, "alien {alien_id} present in more than one roster");
        }
        for (city_id, cell) in &self.cities {
            for alien_id in cell.alien_ids() {
                assert_eq!(
                    self.alien_city.get(&alien_id).map(String::as_str),
                    Some(city_id.as_str()),
                    "roster of {city_id} disagrees with the index for {alien_id}"
                );
            }
            for (side, target) in cell.city().neighbors() {
                if let Some(other) = self.cities.get(target) {
                    assert_eq!(
                        other.city().road(side.opposite()),
                        Some(city_id.as_str()),
                        "road {city_id} {side}={target} is not reciprocated"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::cancel_pair;
    use crate::tests_support::Recorder;
    use invasion_core::CityMap;

    fn profile(name: &str, power: u32) -> AlienProfile {
        AlienProfile {
            name: name.to_string(),
            power,
            step_every: Duration::from_millis(10),
            max_steps: 5,
        }
    }

    /// A<->B<->C chain, long fight timers so nothing fires mid-test.
    fn chain_world() -> (World, Arc<Recorder>, crate::cancel::CancelHandle) {
        let map = CityMap::parse("Alpha east=Beta\nBeta west=Alpha east=Gamma\nGamma west=Beta\n")
            .expect("map");
        let config = SimConfig {
            fight_coef_ms: 60_000,
            rng_seed: Some(7),
            ..SimConfig::default()
        };
        let recorder = Arc::new(Recorder::default());
        let (cancel_handle, cancel) = cancel_pair();
        let world = World::new(&map, recorder.clone(), &config, cancel);
        (world, recorder, cancel_handle)
    }

    /// Places an alien without spawning a runner thread; the test keeps the
    /// mailbox receiver.
    fn land(world: &mut World, alien: AlienProfile, city_id: &str) -> Receiver<AlienEvent> {
        let (mailbox_tx, mailbox_rx) = bounded(1);
        world.place_alien(
            AlienHandle {
                profile: alien,
                mailbox: mailbox_tx,
            },
            city_id,
        );
        mailbox_rx
    }

    #[test]
    fn landing_confirms_location_to_the_alien() {
        let (mut world, recorder, _cancel) = chain_world();
        let mailbox = land(&mut world, profile("#00000000", 1), "Alpha");

        assert_eq!(world.alien_location("#00000000"), Some("Alpha"));
        let event = mailbox.try_recv().expect("relocated event");
        match event {
            AlienEvent::Relocated { alien_id, location } => {
                assert_eq!(alien_id, "#00000000");
                assert_eq!(location.name(), "Alpha");
            }
            other => panic!("expected relocation, got {other:?}"),
        }
        assert_eq!(recorder.relocations(), vec![("#00000000".to_string(), "Alpha".to_string())]);
        world.assert_consistent();
    }

    #[test]
    fn second_lander_starts_a_fight() {
        let (mut world, recorder, _cancel) = chain_world();
        let _a = land(&mut world, profile("#00000000", 1), "Alpha");
        let _b = land(&mut world, profile("#00000001", 1), "Alpha");

        assert!(world.cities.get("Alpha").expect("Alpha").at_fight());
        assert_eq!(recorder.fights_started(), vec!["Alpha".to_string()]);
        world.assert_consistent();
    }

    #[test]
    fn moves_are_rejected_during_a_fight() {
        let (mut world, recorder, _cancel) = chain_world();
        let a = land(&mut world, profile("#00000000", 1), "Alpha");
        let _b = land(&mut world, profile("#00000001", 1), "Alpha");
        let _ = a.try_recv();

        world.handle_move("#00000000", "Beta");

        assert_eq!(world.alien_location("#00000000"), Some("Alpha"));
        assert!(a.try_recv().is_err(), "no relocation event for a refused move");
        assert_eq!(recorder.relocations().len(), 2, "only the two landings");
        world.assert_consistent();
    }

    #[test]
    fn a_lone_alien_moves_along_a_road() {
        let (mut world, recorder, _cancel) = chain_world();
        let mailbox = land(&mut world, profile("#00000000", 1), "Alpha");
        let _ = mailbox.try_recv();

        world.handle_move("#00000000", "Beta");

        assert_eq!(world.alien_location("#00000000"), Some("Beta"));
        match mailbox.try_recv().expect("relocated event") {
            AlienEvent::Relocated { location, .. } => assert_eq!(location.name(), "Beta"),
            other => panic!("expected relocation, got {other:?}"),
        }
        assert_eq!(recorder.relocations().len(), 2);
        world.assert_consistent();
    }

    #[test]
    fn dangling_moves_are_dropped() {
        let (mut world, recorder, _cancel) = chain_world();

        // Unknown alien.
        world.handle_move("#09999999", "Beta");
        // Known alien, unknown destination.
        let _mailbox = land(&mut world, profile("#00000000", 1), "Alpha");
        world.handle_move("#00000000", "Atlantis");

        assert_eq!(world.alien_location("#00000000"), Some("Alpha"));
        assert_eq!(recorder.relocations().len(), 1);
        world.assert_consistent();
    }

    #[test]
    fn evacuation_dismisses_with_reason() {
        let (mut world, recorder, _cancel) = chain_world();
        let mailbox = land(&mut world, profile("#00000000", 1), "Alpha");
        let _ = mailbox.try_recv();

        world.dismiss_alien("#00000000", DismissReason::Evacuated);

        assert_eq!(world.alien_location("#00000000"), None);
        assert_eq!(
            mailbox.try_recv().expect("dismissed event"),
            AlienEvent::Dismissed {
                alien_id: "#00000000".into(),
                reason: DismissReason::Evacuated,
            }
        );
        assert_eq!(
            recorder.dismissals(),
            vec![("#00000000".to_string(), "evacuated".to_string())]
        );
        // Dismissal is final; a second request is a no-op.
        world.dismiss_alien("#00000000", DismissReason::Evacuated);
        assert_eq!(recorder.dismissals().len(), 1);
        world.assert_consistent();
    }

    #[test]
    fn destruction_clears_reciprocal_roads_and_dismisses_the_roster() {
        let (mut world, recorder, _cancel) = chain_world();
        let a = land(&mut world, profile("#00000000", 1), "Beta");
        let b = land(&mut world, profile("#00000001", 1), "Beta");
        let _ = a.try_recv();
        let _ = b.try_recv();

        world.handle_city_destroyed("Beta");

        assert!(!world.cities.contains_key("Beta"));
        assert!(!world.cities.get("Alpha").expect("Alpha").city().has_roads());
        assert!(!world.cities.get("Gamma").expect("Gamma").city().has_roads());
        assert_eq!(
            recorder.updated_cities(),
            vec!["Alpha".to_string(), "Gamma".to_string()]
        );
        assert_eq!(
            recorder.destroyed(),
            vec![(
                "Beta".to_string(),
                vec!["#00000000".to_string(), "#00000001".to_string()]
            )]
        );
        assert_eq!(recorder.dismissals().len(), 2);
        for (_, reason) in recorder.dismissals() {
            assert_eq!(reason, "destroyed");
        }
        assert_eq!(
            a.try_recv().expect("dismissal"),
            AlienEvent::Dismissed {
                alien_id: "#00000000".into(),
                reason: DismissReason::Destroyed,
            }
        );
        world.assert_consistent();
    }

    #[test]
    fn destroying_a_missing_city_is_a_no_op() {
        let (mut world, recorder, _cancel) = chain_world();
        world.handle_city_destroyed("Atlantis");
        assert_eq!(world.cities.len(), 3);
        assert!(recorder.destroyed().is_empty());
    }

    #[test]
    fn disembark_onto_a_destroyed_city_is_dropped() {
        let (mut world, recorder, _cancel) = chain_world();
        let a = land(&mut world, profile("#00000000", 1), "Beta");
        let b = land(&mut world, profile("#00000001", 1), "Beta");
        let _ = (a.try_recv(), b.try_recv());
        world.handle_city_destroyed("Beta");

        world.handle_disembark(profile("#00000002", 1), "Beta");

        assert_eq!(world.alien_location("#00000002"), None);
        assert_eq!(world.alien_city.len(), 0);
        assert_eq!(recorder.relocations().len(), 2, "the late lander never moved");
        world.assert_consistent();
    }

    #[test]
    fn stop_conditions_track_population() {
        let (mut world, recorder, _cancel) = chain_world();
        let a = land(&mut world, profile("#00000000", 1), "Alpha");
        let b = land(&mut world, profile("#00000001", 1), "Gamma");
        let _ = (a.try_recv(), b.try_recv());

        assert!(!world.check_stop_conditions());

        world.dismiss_alien("#00000001", DismissReason::Evacuated);
        assert!(world.check_stop_conditions(), "one alien left");

        let statuses = recorder.statuses();
        assert_eq!(statuses, vec![(2, 3, false), (1, 3, true)]);
    }

    #[test]
    fn stop_fires_when_one_city_remains() {
        let (mut world, _recorder, _cancel) = chain_world();
        let a = land(&mut world, profile("#00000000", 1), "Gamma");
        let b = land(&mut world, profile("#00000001", 1), "Gamma");
        let _ = (a.try_recv(), b.try_recv());

        assert!(!world.check_stop_conditions(), "two aliens, three cities");

        // Raze the empty cities; both aliens survive in Gamma.
        world.handle_city_destroyed("Alpha");
        world.handle_city_destroyed("Beta");
        assert_eq!(world.alien_city.len(), 2);
        assert!(world.check_stop_conditions(), "one city left");
    }
}
