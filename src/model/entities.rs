use std::sync::Arc;

use serde::Serialize;

use crate::model::calendar::Properties;
use crate::shared::geo::Coord;

/// Discriminates the entity kinds the place-lookup side works over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceType {
    StopArea,
    StopPoint,
    Admin,
    Address,
    Poi,
    Line,
}

impl PlaceType {
    /// Fixed display-ordering rank: administrative regions first, then stop
    /// areas, POIs, addresses, everything else last.
    pub const fn embedded_type_order(self) -> u8 {
        match self {
            PlaceType::Admin => 1,
            PlaceType::StopArea => 2,
            PlaceType::Poi => 3,
            PlaceType::Address => 4,
            PlaceType::StopPoint | PlaceType::Line => 5,
        }
    }
}

/// A commercial grouping of stop points (a station, a pair of opposite bus
/// stops sharing a name).
#[derive(Debug, Default, Clone)]
pub struct StopArea {
    /// Global internal index used for O(1) array lookups in the snapshot.
    pub idx: u32,
    /// Stable external identifier.
    pub uri: Arc<str>,
    pub name: Arc<str>,
    pub coord: Coord,
    /// Indices into the global admin array, innermost first.
    pub admin_list: Vec<u32>,
}

/// A physical boarding position, always attached to a stop area.
#[derive(Debug, Default, Clone)]
pub struct StopPoint {
    pub idx: u32,
    pub uri: Arc<str>,
    pub name: Arc<str>,
    pub coord: Coord,
    pub admin_list: Vec<u32>,
    /// Parent stop area index.
    pub stop_area_idx: u32,
    /// Facilities offered at this stop point.
    pub properties: Properties,
}

impl StopPoint {
    pub const fn accessible(&self, required: Properties) -> bool {
        self.properties.supports(required)
    }
}

/// An administrative region used for geographic disambiguation.
#[derive(Debug, Default, Clone)]
pub struct Admin {
    pub idx: u32,
    pub uri: Arc<str>,
    pub name: Arc<str>,
    pub coord: Coord,
    /// Enclosing admins, when the hierarchy is known.
    pub admin_list: Vec<u32>,
}

/// A point of interest.
#[derive(Debug, Default, Clone)]
pub struct Poi {
    pub idx: u32,
    pub uri: Arc<str>,
    pub name: Arc<str>,
    pub coord: Coord,
    pub admin_list: Vec<u32>,
    /// Importance weight, larger is more prominent.
    pub weight: i32,
}

/// A numbered position along a way.
#[derive(Debug, Clone, Copy)]
pub struct HouseNumber {
    pub number: u32,
    pub coord: Coord,
}

/// A named street, carrying the house numbers geocoding resolves against.
#[derive(Debug, Default, Clone)]
pub struct Way {
    pub idx: u32,
    pub uri: Arc<str>,
    pub name: Arc<str>,
    pub coord: Coord,
    pub admin_list: Vec<u32>,
    /// Known house numbers, sorted ascending by number.
    pub house_numbers: Vec<HouseNumber>,
}

impl Way {
    /// Resolves a house number to a position: exact when known, interpolated
    /// between the surrounding numbers otherwise, clamped to the ends of the
    /// range. Falls back to the way's own position when no numbers are known.
    pub fn house_number_coord(&self, number: u32) -> Coord {
        let numbers = &self.house_numbers;
        if numbers.is_empty() {
            return self.coord;
        }
        match numbers.binary_search_by_key(&number, |hn| hn.number) {
            Ok(i) => numbers[i].coord,
            Err(0) => numbers[0].coord,
            Err(i) if i == numbers.len() => numbers[numbers.len() - 1].coord,
            Err(i) => {
                let lo = &numbers[i - 1];
                let hi = &numbers[i];
                let t = (number - lo.number) as f64 / (hi.number - lo.number) as f64;
                lo.coord.lerp(hi.coord, t)
            }
        }
    }
}

/// A commercial line ("Bus 42").
#[derive(Debug, Default, Clone)]
pub struct Line {
    pub idx: u32,
    pub uri: Arc<str>,
    pub name: Arc<str>,
    pub coord: Coord,
    pub admin_list: Vec<u32>,
}

#[test]
fn house_number_exact_and_interpolated() {
    let way = Way {
        house_numbers: vec![
            HouseNumber {
                number: 1,
                coord: Coord::new(0.0, 0.0),
            },
            HouseNumber {
                number: 21,
                coord: Coord::new(2.0, 0.0),
            },
        ],
        ..Default::default()
    };
    assert_eq!(way.house_number_coord(1).lon, 0.0);
    assert_eq!(way.house_number_coord(21).lon, 2.0);
    assert_eq!(way.house_number_coord(11).lon, 1.0);
    // out of range clamps
    assert_eq!(way.house_number_coord(40).lon, 2.0);
}

#[test]
fn embedded_type_order_ranks() {
    assert!(PlaceType::Admin.embedded_type_order() < PlaceType::StopArea.embedded_type_order());
    assert!(PlaceType::StopArea.embedded_type_order() < PlaceType::Poi.embedded_type_order());
    assert!(PlaceType::Poi.embedded_type_order() < PlaceType::Address.embedded_type_order());
    assert!(PlaceType::Address.embedded_type_order() < PlaceType::Line.embedded_type_order());
    assert_eq!(
        PlaceType::StopPoint.embedded_type_order(),
        PlaceType::Line.embedded_type_order()
    );
}
