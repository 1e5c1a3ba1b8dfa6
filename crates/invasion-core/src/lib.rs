//! City map, alien profiles, and configuration shared across the invasion workspace.

mod alien;
mod city;
mod citymap;
mod config;

pub use alien::AlienProfile;
pub use city::{City, Side};
pub use citymap::{CityMap, MapError};
pub use config::{ConfigError, SimConfig};
