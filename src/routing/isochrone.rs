use serde::Serialize;

use crate::model::{AccessibilityParams, Data};
use crate::routing::{self, run_raptor};
use crate::shared::datetime::DateTime;
use crate::shared::geo::Coord;

/// A reachability invocation: like a journey query without destinations.
#[derive(Debug, Clone)]
pub struct IsochroneQuery {
    pub origins: Vec<(String, u32)>,
    pub datetime: DateTime,
    pub access: AccessibilityParams,
    pub max_duration: u32,
    /// Travel times under this carve a hole in their polygon.
    pub min_duration: u32,
    pub max_transfers: u32,
    /// Meters per second left once off the network.
    pub walking_speed: f64,
}

/// A ring-with-holes polygon, ready for GeoJSON-style serialization.
#[derive(Debug, Clone, Serialize)]
pub struct Polygon {
    pub outer: Vec<Coord>,
    pub inners: Vec<Vec<Coord>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphicalIsochrone {
    pub min_duration: u32,
    pub max_duration: u32,
    pub polygons: Vec<Polygon>,
}

const CIRCLE_STEPS: usize = 36;

/// Computes the area reachable from the origins within the duration window.
///
/// Every stop point the network reaches in time gets a circle sized by the
/// time left for walking; stops reached before `min_duration` additionally
/// get an inner ring marking the too-close hole. Geometry stays per-stop, no
/// union pass.
pub fn isochrone(
    data: &Data,
    query: &IsochroneQuery,
) -> Result<Vec<GraphicalIsochrone>, routing::Error> {
    let origins = routing::resolve_places(data, &query.origins)?;
    let result = run_raptor(
        data,
        &origins,
        query.datetime,
        &query.access,
        true,
        query.max_duration,
        query.max_transfers,
    );

    let mut polygons = Vec::new();
    for (sp_idx, label) in result.best.iter().enumerate() {
        let Some(label) = label else { continue };
        let duration = label.seconds_since(query.datetime) as u32;
        let remaining = query.max_duration.saturating_sub(duration);
        let radius = remaining as f64 * query.walking_speed;
        if radius <= 0.0 {
            continue;
        }
        let center = data.stop_points[sp_idx].coord;
        let inners = if duration < query.min_duration {
            let hole = (query.min_duration - duration) as f64 * query.walking_speed;
            if hole < radius {
                vec![circle(center, hole)]
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        };
        polygons.push(Polygon {
            outer: circle(center, radius),
            inners,
        });
    }

    if polygons.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![GraphicalIsochrone {
        min_duration: query.min_duration,
        max_duration: query.max_duration,
        polygons,
    }])
}

/// A closed ring approximating a circle of `radius_m` meters.
fn circle(center: Coord, radius_m: f64) -> Vec<Coord> {
    let mut ring: Vec<Coord> = (0..CIRCLE_STEPS)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / CIRCLE_STEPS as f64;
            center.offset_meters(radius_m * angle.cos(), radius_m * angle.sin())
        })
        .collect();
    ring.push(ring[0]);
    ring
}

#[test]
fn circle_is_closed_and_dense() {
    let ring = circle(Coord::new(2.35, 48.85), 500.0);
    assert_eq!(ring.len(), CIRCLE_STEPS + 1);
    assert_eq!(ring[0], ring[CIRCLE_STEPS]);
}
