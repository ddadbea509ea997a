mod calendar;
mod entities;
mod timetable;

pub mod builder;

pub use calendar::*;
pub use entities::*;
pub use timetable::*;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::search::SearchIndex;

/// A footpath between two stop points.
#[derive(Debug, Default, Clone, Copy)]
pub struct Connection {
    pub to_stop_point_idx: u32,
    /// Walking time in seconds.
    pub duration: u32,
}

/// The immutable in-memory snapshot every query reads.
///
/// Entity arrays are dense and indexed by each entity's `idx`; cross-entity
/// references are indices into the sibling arrays. The snapshot is built once
/// by an external loader, frozen with [`Data::rebuild`], then shared behind an
/// `Arc` for the lifetime of the engine. Nothing here mutates after that.
#[derive(Debug, Default, Clone)]
pub struct Data {
    // --- Place entities ---
    pub stop_areas: Box<[StopArea]>,
    pub stop_points: Box<[StopPoint]>,
    pub admins: Box<[Admin]>,
    pub pois: Box<[Poi]>,
    pub ways: Box<[Way]>,
    pub lines: Box<[Line]>,

    // --- Schedule entities ---
    pub journey_patterns: Box<[JourneyPattern]>,
    pub journey_pattern_points: Box<[JourneyPatternPoint]>,
    pub vehicle_journeys: Box<[VehicleJourney]>,
    pub stop_times: Box<[StopTime]>,
    pub validity_patterns: Box<[ValidityPattern]>,
    /// Footpaths out of each stop point. May be empty.
    pub connections: Box<[Box<[Connection]>]>,

    /// The sorted departure/arrival tables the stop-time kernel searches.
    pub timetable: Timetable,

    /// Day offset 0 of every validity pattern.
    pub reference_date: NaiveDate,

    // --- Text search configuration ---
    /// One-to-one token rewrites applied before lookup ("bd" -> "boulevard").
    pub alias: HashMap<String, String>,
    /// One-to-many token expansions ("cc" -> ["centre", "commercial"]).
    pub synonyms: HashMap<String, Vec<String>>,
    /// Penalty per extra stored word when ranking matches.
    pub word_weight: i32,

    // --- Per-type autocomplete indices ---
    pub stop_area_index: SearchIndex,
    pub stop_point_index: SearchIndex,
    pub admin_index: SearchIndex,
    pub poi_index: SearchIndex,
    pub way_index: SearchIndex,
    pub line_index: SearchIndex,

    // --- Lookups ---
    stop_area_lookup: HashMap<Arc<str>, u32>,
    stop_point_lookup: HashMap<Arc<str>, u32>,
    admin_lookup: HashMap<Arc<str>, u32>,
    stop_area_to_stop_points: Box<[Box<[u32]>]>,
    stop_point_to_jpps: Box<[Box<[u32]>]>,
}

impl Data {
    pub fn new() -> Self {
        Default::default()
    }

    /// Rebuilds every derived structure from the entity arrays: uri lookups,
    /// adjacency lists, the kernel's sorted timetable and the autocomplete
    /// indices. Must run once after the loader fills the arrays and before
    /// the snapshot is shared.
    pub fn rebuild(&mut self) {
        self.stop_area_lookup = self
            .stop_areas
            .iter()
            .map(|sa| (sa.uri.clone(), sa.idx))
            .collect();
        self.stop_point_lookup = self
            .stop_points
            .iter()
            .map(|sp| (sp.uri.clone(), sp.idx))
            .collect();
        self.admin_lookup = self
            .admins
            .iter()
            .map(|a| (a.uri.clone(), a.idx))
            .collect();

        let mut area_to_points: Vec<Vec<u32>> = vec![Vec::new(); self.stop_areas.len()];
        for sp in &self.stop_points {
            area_to_points[sp.stop_area_idx as usize].push(sp.idx);
        }
        self.stop_area_to_stop_points = area_to_points.into_iter().map(Into::into).collect();

        let mut point_to_jpps: Vec<Vec<u32>> = vec![Vec::new(); self.stop_points.len()];
        for jpp in &self.journey_pattern_points {
            point_to_jpps[jpp.stop_point_idx as usize].push(jpp.idx);
        }
        self.stop_point_to_jpps = point_to_jpps.into_iter().map(Into::into).collect();

        if self.connections.len() != self.stop_points.len() {
            self.connections = vec![Box::default(); self.stop_points.len()].into();
        }

        self.timetable = Timetable::build(
            &self.journey_patterns,
            &self.vehicle_journeys,
            &self.stop_times,
        );

        self.stop_area_index = SearchIndex::build(self.stop_areas.iter().map(|e| e.name.as_ref()));
        self.stop_point_index =
            SearchIndex::build(self.stop_points.iter().map(|e| e.name.as_ref()));
        self.admin_index = SearchIndex::build(self.admins.iter().map(|e| e.name.as_ref()));
        self.poi_index = SearchIndex::build(self.pois.iter().map(|e| e.name.as_ref()));
        self.way_index = SearchIndex::build(self.ways.iter().map(|e| e.name.as_ref()));
        self.line_index = SearchIndex::build(self.lines.iter().map(|e| e.name.as_ref()));
    }

    pub fn stop_area_by_uri(&self, uri: &str) -> Option<&StopArea> {
        let idx = self.stop_area_lookup.get(uri)?;
        Some(&self.stop_areas[*idx as usize])
    }

    pub fn stop_point_by_uri(&self, uri: &str) -> Option<&StopPoint> {
        let idx = self.stop_point_lookup.get(uri)?;
        Some(&self.stop_points[*idx as usize])
    }

    pub fn admin_by_uri(&self, uri: &str) -> Option<&Admin> {
        let idx = self.admin_lookup.get(uri)?;
        Some(&self.admins[*idx as usize])
    }

    pub fn stop_points_by_area_idx(&self, area_idx: u32) -> &[u32] {
        &self.stop_area_to_stop_points[area_idx as usize]
    }

    /// Journey-pattern points visiting a stop point.
    pub fn jpps_by_stop_point_idx(&self, stop_point_idx: u32) -> &[u32] {
        &self.stop_point_to_jpps[stop_point_idx as usize]
    }

    /// Resolves admin uris to indices, silently skipping unknown ones.
    pub fn admin_idxs_for_uris<'a>(&self, uris: impl IntoIterator<Item = &'a str>) -> Vec<u32> {
        uris.into_iter()
            .filter_map(|uri| self.admin_lookup.get(uri).copied())
            .collect()
    }
}
