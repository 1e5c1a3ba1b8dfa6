//! The per-alien runner: a thread that ticks, asks the world to move it,
//! and reacts to events delivered into its mailbox.
//!
//! An alien owns no shared state. It only reads its own profile and step
//! counter; every mutation of the world goes through the request channel,
//! and the world answers by posting events back into the mailbox.

use std::thread;

use crossbeam_channel::{select, tick, Receiver, Sender};
use invasion_core::{AlienProfile, City};
use rand::{rngs::SmallRng, Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::cancel::CancelToken;
use crate::messages::{AlienEvent, AlienRequest};

pub(crate) struct AlienRunner {
    profile: AlienProfile,
    location: City,
    steps_used: u32,
    events: Receiver<AlienEvent>,
    requests: Sender<AlienRequest>,
    rng: SmallRng,
    cancel: CancelToken,
}

impl AlienRunner {
    /// Spawns the runner thread for a freshly disembarked alien.
    pub(crate) fn spawn(
        profile: AlienProfile,
        start_location: City,
        events: Receiver<AlienEvent>,
        requests: Sender<AlienRequest>,
        seed: u64,
        cancel: CancelToken,
    ) {
        let runner = Self {
            location: start_location,
            steps_used: 0,
            events,
            requests,
            rng: SmallRng::seed_from_u64(seed),
            cancel,
            profile,
        };
        let thread_name = format!("alien-{}", runner.profile.name);
        if let Err(err) = thread::Builder::new()
            .name(thread_name)
            .spawn(move || runner.run())
        {
            error!(?err, "failed to spawn alien thread");
        }
    }

    fn run(mut self) {
        // Local handles so the select arms are free to mutate the runner.
        let cancel = self.cancel.clone();
        let events = self.events.clone();
        let ticker = tick(self.profile.step_every);
        loop {
            select! {
                recv(cancel.done()) -> _ => break,
                recv(events) -> event => match event {
                    Ok(event) => {
                        if !self.handle_event(event) {
                            break;
                        }
                    }
                    // Mailbox sender gone without a dismissal: the world
                    // itself shut down.
                    Err(_) => break,
                },
                recv(ticker) -> _ => {
                    if !self.handle_step() {
                        break;
                    }
                }
            }
        }
    }

    /// Applies a world event; false ends the runner.
    fn handle_event(&mut self, event: AlienEvent) -> bool {
        if event.target_id() != self.profile.name {
            warn!(
                alien = %self.profile.name,
                target = %event.target_id(),
                "event skipped: target mismatch"
            );
            return true;
        }

        match event {
            AlienEvent::Relocated { location, .. } => {
                self.location = location;
                true
            }
            AlienEvent::Dismissed { reason, .. } => {
                info!(alien = %self.profile.name, %reason, "alien dismissed");
                false
            }
        }
    }

    /// Emits the next request for a step tick; false ends the runner (the
    /// world hung up on the request channel).
    ///
    /// An exhausted alien keeps asking to evacuate until the dismissal
    /// arrives. A tick in a city with no outgoing roads still spends a step.
    fn handle_step(&mut self) -> bool {
        if self.steps_used >= self.profile.max_steps {
            let request = AlienRequest::Evacuate {
                alien_id: self.profile.name.clone(),
            };
            return self.requests.send(request).is_ok();
        }
        self.steps_used += 1;

        let roads = self.location.available_roads();
        if roads.is_empty() {
            return true;
        }

        let target = roads[self.rng.random_range(0..roads.len())].to_string();
        let request = AlienRequest::Move {
            alien_id: self.profile.name.clone(),
            city_id: target,
        };
        self.requests.send(request).is_ok()
    }
}
