//! Positions as they appear in arena records.
//!
//! Arena records store coordinates as plain strings (`"x,y,z"`) so that
//! operators can edit them by hand. Locations that also name a world are
//! stored as a two-element array: `["x,y,z", "world"]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{TypesError, WorldId};

// ---------------------------------------------------------------------------
// Vec3
// ---------------------------------------------------------------------------

/// A point in a world.
///
/// Serialized as its textual form (`"x,y,z"`). Formatting uses Rust's
/// shortest round-trip float representation, so `parse(format(v)) == v`
/// holds exactly for every finite coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns this point shifted by the given offsets.
    pub fn add(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The centre of the block this point names (spawn points are stored
    /// as block corners).
    pub fn block_centre(self) -> Self {
        self.add(0.5, 0.0, 0.5)
    }

    pub fn distance(self, other: Vec3) -> f64 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for Vec3 {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidPosition(s.to_string());

        let mut parts = s.split(',');
        let mut next = || -> Result<f64, TypesError> {
            let value: f64 = parts
                .next()
                .ok_or_else(invalid)?
                .trim()
                .parse()
                .map_err(|_| invalid())?;
            // NaN would break exact round-tripping (NaN != NaN).
            if value.is_finite() { Ok(value) } else { Err(invalid()) }
        };

        let pos = Vec3::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(pos)
    }
}

impl TryFrom<String> for Vec3 {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Vec3> for String {
    fn from(value: Vec3) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A position bound to a named world.
///
/// Serialized as `["x,y,z", "world"]`, the shape used by the `leavePos`,
/// `lobby` and `joinsign` record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Vec3, WorldId)", into = "(Vec3, WorldId)")]
pub struct Location {
    pub pos: Vec3,
    pub world: WorldId,
}

impl Location {
    pub fn new(pos: Vec3, world: impl Into<WorldId>) -> Self {
        Self {
            pos,
            world: world.into(),
        }
    }

    /// Same block, same world. Used to match a tapped block against the
    /// configured join sign.
    pub fn same_block(&self, other: &Location) -> bool {
        self.world == other.world
            && self.pos.x.floor() == other.pos.x.floor()
            && self.pos.y.floor() == other.pos.y.floor()
            && self.pos.z.floor() == other.pos.z.floor()
    }
}

impl From<(Vec3, WorldId)> for Location {
    fn from((pos, world): (Vec3, WorldId)) -> Self {
        Self { pos, world }
    }
}

impl From<Location> for (Vec3, WorldId) {
    fn from(value: Location) -> Self {
        (value.pos, value.world)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.pos, self.world)
    }
}

// =========================================================================
// Tests
// =========================================================================
