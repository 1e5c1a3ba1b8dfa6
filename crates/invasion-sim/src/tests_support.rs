//! Recording listener shared by the coordinator unit tests.

use std::sync::Mutex;

use invasion_core::City;
use invasion_monitor::WorldEventsListener;

#[derive(Debug, Default)]
pub(crate) struct Recorder {
    updated: Mutex<Vec<String>>,
    fights: Mutex<Vec<String>>,
    destroyed: Mutex<Vec<(String, Vec<String>)>>,
    relocations: Mutex<Vec<(String, String)>>,
    dismissals: Mutex<Vec<(String, String)>>,
    statuses: Mutex<Vec<(usize, usize, bool)>>,
}

impl Recorder {
    pub(crate) fn updated_cities(&self) -> Vec<String> {
        self.updated.lock().expect("updated lock").clone()
    }

    pub(crate) fn fights_started(&self) -> Vec<String> {
        self.fights.lock().expect("fights lock").clone()
    }

    pub(crate) fn destroyed(&self) -> Vec<(String, Vec<String>)> {
        self.destroyed.lock().expect("destroyed lock").clone()
    }

    pub(crate) fn relocations(&self) -> Vec<(String, String)> {
        self.relocations.lock().expect("relocations lock").clone()
    }

    pub(crate) fn dismissals(&self) -> Vec<(String, String)> {
        self.dismissals.lock().expect("dismissals lock").clone()
    }

    pub(crate) fn statuses(&self) -> Vec<(usize, usize, bool)> {
        self.statuses.lock().expect("statuses lock").clone()
    }
}

impl WorldEventsListener for Recorder {
    fn city_updated(&self, city: &City) {
        self.updated
            .lock()
            .expect("updated lock")
            .push(city.name().to_string());
    }

    fn city_fight_started(&self, city_id: &str) {
        self.fights
            .lock()
            .expect("fights lock")
            .push(city_id.to_string());
    }

    fn city_destroyed(&self, city_id: &str, alien_ids: &[String]) {
        self.destroyed
            .lock()
            .expect("destroyed lock")
            .push((city_id.to_string(), alien_ids.to_vec()));
    }

    fn alien_relocated(&self, alien_id: &str, new_city_id: &str) {
        self.relocations
            .lock()
            .expect("relocations lock")
            .push((alien_id.to_string(), new_city_id.to_string()));
    }

    fn alien_dismissed(&self, alien_id: &str, reason: &str) {
        self.dismissals
            .lock()
            .expect("dismissals lock")
            .push((alien_id.to_string(), reason.to_string()));
    }

    fn sim_status(&self, aliens: usize, cities: usize, stopped: bool) {
        self.statuses
            .lock()
            .expect("statuses lock")
            .push((aliens, cities, stopped));
    }
}
