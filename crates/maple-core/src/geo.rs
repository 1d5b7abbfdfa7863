//! # Geo Module
//!
//! Distance and direction between two points given in decimal degrees.
//!
//! Distance is the haversine great-circle distance on a spherical Earth.
//! Direction is a planar bearing on the raw degree deltas, bucketed into the
//! eight compass points. The planar bearing is coarse near the poles, which is
//! acceptable for a hint shown as one of eight arrows.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Width of one compass sector in degrees.
const SECTOR_DEGREES: f64 = 45.0;

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside their valid ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// =============================================================================
// DIRECTION
// =============================================================================

/// One of the eight compass points, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Direction {
    /// All directions in sector order (index 0 is north, clockwise).
    pub const ALL: [Direction; 8] = [
        Direction::N,
        Direction::NE,
        Direction::E,
        Direction::SE,
        Direction::S,
        Direction::SW,
        Direction::W,
        Direction::NW,
    ];

    /// Abbreviation as shown to players.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::N => "N",
            Self::NE => "NE",
            Self::E => "E",
            Self::SE => "SE",
            Self::S => "S",
            Self::SW => "SW",
            Self::W => "W",
            Self::NW => "NW",
        }
    }

    /// Bucket an angle (degrees clockwise from north, any sign) into a sector.
    ///
    /// Ties on a sector boundary go to the clockwise neighbour.
    #[must_use]
    pub fn from_angle(degrees: f64) -> Self {
        let sector = (degrees / SECTOR_DEGREES + 0.5).floor() as i64;
        Self::ALL[(sector & 7) as usize]
    }

    /// The direction pointing the other way.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::N => Self::S,
            Self::NE => Self::SW,
            Self::E => Self::W,
            Self::SE => Self::NW,
            Self::S => Self::N,
            Self::SW => Self::NE,
            Self::W => Self::E,
            Self::NW => Self::SE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown direction: {s}"))
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

fn to_radians(degrees: f64) -> f64 {
    degrees * (PI / 180.0)
}

/// Great-circle distance in whole kilometres.
#[must_use]
pub fn distance_km(from: Coordinates, to: Coordinates) -> u32 {
    let d_lat = to_radians(to.latitude - from.latitude);
    let d_lon = to_radians(to.longitude - from.longitude);

    let a = (d_lat / 2.0).sin().powi(2)
        + to_radians(from.latitude).cos()
            * to_radians(to.latitude).cos()
            * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    (EARTH_RADIUS_KM * c).round() as u32
}

/// Compass direction to travel from `from` to reach `to`.
#[must_use]
pub fn direction(from: Coordinates, to: Coordinates) -> Direction {
    let d_lon = to.longitude - from.longitude;
    let d_lat = to.latitude - from.latitude;

    let angle = d_lon.atan2(d_lat) * (180.0 / PI);

    Direction::from_angle(angle)
}

// =============================================================================
// TESTS
// =============================================================================
