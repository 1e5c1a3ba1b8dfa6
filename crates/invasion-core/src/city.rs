use std::fmt;

/// One of the four cardinal road slots a city can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    /// All sides in canonical north/east/south/west order.
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    /// Lowercase name used by the map file format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::North => "north",
            Side::East => "east",
            Side::South => "south",
            Side::West => "west",
        }
    }

    /// The side a reciprocal road must occupy on the neighboring city.
    #[must_use]
    pub const fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::East => Side::West,
            Side::South => Side::North,
            Side::West => Side::East,
        }
    }

    /// Parses a side keyword, case-insensitively.
    #[must_use]
    pub fn parse(token: &str) -> Option<Side> {
        match token.to_ascii_lowercase().as_str() {
            "north" => Some(Side::North),
            "east" => Some(Side::East),
            "south" => Some(Side::South),
            "west" => Some(Side::West),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            Side::North => 0,
            Side::East => 1,
            Side::South => 2,
            Side::West => 3,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the map graph: a named city and up to four outgoing roads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct City {
    name: String,
    roads: [Option<String>; 4],
}

impl City {
    /// Creates a city with no roads.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roads: [None, None, None, None],
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target city of the road on `side`, if any.
    #[must_use]
    pub fn road(&self, side: Side) -> Option<&str> {
        self.roads[side.index()].as_deref()
    }

    pub fn set_road(&mut self, side: Side, target: impl Into<String>) {
        self.roads[side.index()] = Some(target.into());
    }

    pub fn clear_road(&mut self, side: Side) {
        self.roads[side.index()] = None;
    }

    /// Clears every road slot pointing at `city_id`.
    pub fn remove_roads_to(&mut self, city_id: &str) {
        for slot in &mut self.roads {
            if slot.as_deref() == Some(city_id) {
                *slot = None;
            }
        }
    }

    /// Populated road targets in north/east/south/west order.
    #[must_use]
    pub fn available_roads(&self) -> Vec<&str> {
        self.roads.iter().filter_map(|slot| slot.as_deref()).collect()
    }

    /// Populated `(side, target)` pairs in canonical order.
    pub fn neighbors(&self) -> impl Iterator<Item = (Side, &str)> {
        Side::ALL
            .into_iter()
            .filter_map(|side| self.road(side).map(|target| (side, target)))
    }

    /// True when at least one road leads out of the city.
    #[must_use]
    pub fn has_roads(&self) -> bool {
        self.roads.iter().any(Option::is_some)
    }
}
