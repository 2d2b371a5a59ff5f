//! The fixed catalog of catheter insertion sites.
//!
//! The catalog is a constant table of eight locations. Its order is
//! significant: the suggestion engine breaks ties by catalog position.

use serde::Serialize;

/// Body region of an insertion site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// Abdomen.
    Abdomen,
    /// Thighs.
    Legs,
    /// Buttocks.
    Glutes,
    /// Lower back.
    Lumbar,
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abdomen => f.pad("abdomen"),
            Self::Legs => f.pad("legs"),
            Self::Glutes => f.pad("glutes"),
            Self::Lumbar => f.pad("lumbar"),
        }
    }
}

/// Side of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Left side.
    Left,
    /// Right side.
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => f.pad("left"),
            Self::Right => f.pad("right"),
        }
    }
}

/// A catheter insertion site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    /// Stable identifier, persisted in records.
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Body region.
    pub zone: Zone,
    /// Body side.
    pub side: Side,
}

impl Location {
    const fn new(id: &'static str, display_name: &'static str, zone: Zone, side: Side) -> Self {
        Self {
            id,
            display_name,
            zone,
            side,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.display_name)
    }
}

/// Number of locations in the catalog.
pub const LOCATION_COUNT: usize = 8;

/// Id of the location suggested when there is no history.
pub const DEFAULT_LOCATION_ID: &str = "abdomen_left";

/// All insertion sites, in tie-break order.
pub static LOCATIONS: [Location; LOCATION_COUNT] = [
    Location::new("abdomen_left", "Left abdomen", Zone::Abdomen, Side::Left),
    Location::new("abdomen_right", "Right abdomen", Zone::Abdomen, Side::Right),
    Location::new("leg_left", "Left thigh", Zone::Legs, Side::Left),
    Location::new("leg_right", "Right thigh", Zone::Legs, Side::Right),
    Location::new("glute_left", "Left glute", Zone::Glutes, Side::Left),
    Location::new("glute_right", "Right glute", Zone::Glutes, Side::Right),
    Location::new("lumbar_left", "Left lower back", Zone::Lumbar, Side::Left),
    Location::new("lumbar_right", "Right lower back", Zone::Lumbar, Side::Right),
];

/// The catalog as a slice.
#[must_use]
pub fn all() -> &'static [Location] {
    &LOCATIONS
}

/// Look up a location by id.
#[must_use]
pub fn find(id: &str) -> Option<&'static Location> {
    LOCATIONS.iter().find(|loc| loc.id == id)
}

/// Position of a location id in the catalog.
#[must_use]
pub fn position(id: &str) -> Option<usize> {
    LOCATIONS.iter().position(|loc| loc.id == id)
}

/// The cold-start location.
#[must_use]
pub fn default_location() -> &'static Location {
    // The id is one of the table entries; the fallback keeps this total.
    find(DEFAULT_LOCATION_ID).unwrap_or(&LOCATIONS[0])
}

/// The first catalog entry, used when a stored id no longer resolves.
#[must_use]
pub fn first() -> &'static Location {
    &LOCATIONS[0]
}
