use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub(crate) const LONGITUDE_DISTANCE: f64 = 111_320.0;
pub(crate) const LATITUDE_DISTANCE: f64 = 110_540.0;

/// A WGS84 position, longitude first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Interpolates between two positions; `t` in [0, 1].
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    /// Offsets the position by meters east and north, using the flat-earth
    /// approximation that is good enough at isochrone scale.
    pub fn offset_meters(self, east: f64, north: f64) -> Self {
        Self {
            lon: self.lon + east / LONGITUDE_DISTANCE,
            lat: self.lat + north / LATITUDE_DISTANCE,
        }
    }
}

impl Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{};{}", self.lon, self.lat))
    }
}

#[test]
fn lerp_midpoint() {
    let a = Coord::new(0.0, 0.0);
    let b = Coord::new(2.0, 4.0);
    let mid = a.lerp(b, 0.5);
    assert_eq!(mid.lon, 1.0);
    assert_eq!(mid.lat, 2.0);
}

#[test]
fn offset_north_increases_latitude() {
    let origin = Coord::new(2.35, 48.85);
    let moved = origin.offset_meters(0.0, 1000.0);
    assert!(moved.lat > origin.lat);
    assert_eq!(moved.lon, origin.lon);
}
