use std::fmt;

use invasion_core::{AlienProfile, City};

/// Requests an alien sends to the world coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlienRequest {
    /// Intention to move to an adjacent city.
    Move { alien_id: String, city_id: String },
    /// Out of steps; asks to leave the simulation.
    Evacuate { alien_id: String },
}

impl AlienRequest {
    /// The alien that originated the request.
    #[must_use]
    pub fn source_id(&self) -> &str {
        match self {
            AlienRequest::Move { alien_id, .. } | AlienRequest::Evacuate { alien_id } => alien_id,
        }
    }
}

/// Requests originated inside the world: fight timers and disembark pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldRequest {
    /// An alien lands at `city_id` and comes into existence.
    Disembark { alien: AlienProfile, city_id: String },
    /// A city's fight timer expired; the city must be destroyed.
    CityDestroyed { city_id: String },
}

/// Events the world delivers into an alien's mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlienEvent {
    /// The world committed a move; `location` is the destination snapshot.
    Relocated { alien_id: String, location: City },
    /// Final removal from the simulation.
    Dismissed {
        alien_id: String,
        reason: DismissReason,
    },
}

impl AlienEvent {
    /// The alien the event is addressed to.
    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            AlienEvent::Relocated { alien_id, .. } | AlienEvent::Dismissed { alien_id, .. } => {
                alien_id
            }
        }
    }
}

/// Why an alien left the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    /// Step budget exhausted.
    Evacuated,
    /// Died in the destruction of its city.
    Destroyed,
}

impl DismissReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DismissReason::Evacuated => "evacuated",
            DismissReason::Destroyed => "destroyed",
        }
    }
}

impl fmt::Display for DismissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
