use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::city::{City, Side};

/// Errors raised while parsing or validating a city map.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("reading map file: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: road link `{token}`: expected side=CityName")]
    MalformedRoad { line: usize, token: String },
    #[error("line {line}: unknown side `{side}` (north/east/south/west expected)")]
    UnknownSide { line: usize, side: String },
    #[error("line {line}: duplicate city `{name}`")]
    DuplicateCity { line: usize, name: String },
    #[error("city `{name}`: invalid name")]
    InvalidName { name: String },
    #[error("city `{city}`: {side} road to `{target}` is not reciprocated")]
    AsymmetricRoad {
        city: String,
        side: Side,
        target: String,
    },
}

/// The static map graph, keyed by city name.
///
/// Iteration order is the sorted name order, which keeps seeded runs
/// reproducible and the canonical rendering stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityMap {
    cities: BTreeMap<String, City>,
}

impl CityMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the map file format: one city per line,
    /// `CityName [side=OtherName ...]`, sides case-insensitive, tokens
    /// separated by single spaces. A run of spaces yields an empty token,
    /// which is a parse error; a blank line yields an empty-named entry
    /// that [`CityMap::validate`] rejects.
    ///
    /// Parsing does not check adjacency; call [`CityMap::validate`] before
    /// handing the map to the engine.
    pub fn parse(input: &str) -> Result<Self, MapError> {
        let mut cities = BTreeMap::new();

        for (idx, raw) in input.lines().enumerate() {
            let line = idx + 1;
            let mut tokens = raw.split(' ');
            let name = tokens.next().unwrap_or("");

            let mut city = City::new(name);
            for token in tokens {
                let (side, target) = match token.split_once('=') {
                    Some((side, target)) if !target.contains('=') => (side, target),
                    _ => {
                        return Err(MapError::MalformedRoad {
                            line,
                            token: token.to_string(),
                        });
                    }
                };
                let Some(side) = Side::parse(side) else {
                    return Err(MapError::UnknownSide {
                        line,
                        side: side.to_string(),
                    });
                };
                // An empty target is the same as no road.
                if !target.is_empty() {
                    city.set_road(side, target);
                }
            }

            if cities.contains_key(name) {
                return Err(MapError::DuplicateCity {
                    line,
                    name: name.to_string(),
                });
            }
            cities.insert(name.to_string(), city);
        }

        Ok(Self { cities })
    }

    /// Reads and parses a map file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Checks map integrity: city names match the allowed shape, and every
    /// road is reciprocated on the opposite side of its target.
    pub fn validate(&self) -> Result<(), MapError> {
        for (name, city) in &self.cities {
            if !valid_city_name(name) {
                return Err(MapError::InvalidName { name: name.clone() });
            }
            for (side, target) in city.neighbors() {
                let reciprocal = self
                    .cities
                    .get(target)
                    .and_then(|other| other.road(side.opposite()));
                if reciprocal != Some(name.as_str()) {
                    return Err(MapError::AsymmetricRoad {
                        city: name.clone(),
                        side,
                        target: target.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Renders the canonical textual form: cities sorted by name, sides in
    /// north/east/south/west order. `parse(render(m)) == m` for valid maps.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, city) in &self.cities {
            out.push_str(name);
            for (side, target) in city.neighbors() {
                let _ = write!(out, " {side}={target}");
            }
            out.push('\n');
        }
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cities.contains_key(name)
    }

    /// Cities in sorted name order.
    pub fn cities(&self) -> impl Iterator<Item = &City> {
        self.cities.values()
    }

    /// City names in sorted order.
    #[must_use]
    pub fn city_names(&self) -> Vec<String> {
        self.cities.keys().cloned().collect()
    }

    /// Inserts a city, replacing any previous entry with the same name.
    pub fn insert(&mut self, city: City) {
        self.cities.insert(city.name().to_string(), city);
    }
}

/// Letters with single internal spaces or hyphens: `^[A-Za-z]+([ -][A-Za-z]+)*$`.
fn valid_city_name(name: &str) -> bool {
    let mut expect_letter = true;
    for ch in name.chars() {
        if ch.is_ascii_alphabetic() {
            expect_letter = false;
        } else if (ch == ' ' || ch == '-') && !expect_letter {
            expect_letter = true;
        } else {
            return false;
        }
    }
    !expect_letter && !name.is_empty()
}
