//! Programmatic snapshot construction.
//!
//! Production data comes out of an external loader; this builder exists for
//! tests and demo datasets, wiring the same arrays the loader would and
//! finishing with [`Data::rebuild`]. Builder methods panic on inconsistent
//! input, which is a bug in the caller, not a runtime condition.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::{
    Admin, Connection, Data, Frequency, HouseNumber, JourneyPattern, JourneyPatternPoint, Line,
    Poi, Properties, StopArea, StopPoint, StopTime, ValidityPattern, VehicleJourney,
    VehicleProperties, Way,
};
use crate::shared::geo::Coord;

/// Parses "8:00" or "8:00:30" to seconds within day.
pub fn hms(text: &str) -> u32 {
    let mut parts = text.split(':');
    let hours: u32 = parts.next().and_then(|p| p.parse().ok()).expect("hours");
    let minutes: u32 = parts.next().and_then(|p| p.parse().ok()).expect("minutes");
    let seconds: u32 = parts.next().map(|p| p.parse().expect("seconds")).unwrap_or(0);
    hours * 3600 + minutes * 60 + seconds
}

struct StopSpec {
    stop_point_idx: u32,
    arrival: u32,
    departure: u32,
    pick_up_allowed: bool,
    drop_off_allowed: bool,
}

struct VjSpec {
    uri: String,
    line_idx: u32,
    days: String,
    vehicle_properties: VehicleProperties,
    /// `(start, end, headway)` window at the first stop.
    frequency: Option<(u32, u32, u32)>,
    stops: Vec<StopSpec>,
}

#[derive(Default)]
pub struct NetworkBuilder {
    reference_date: NaiveDate,
    stop_areas: Vec<StopArea>,
    stop_points: Vec<StopPoint>,
    admins: Vec<Admin>,
    pois: Vec<Poi>,
    ways: Vec<Way>,
    lines: Vec<Line>,
    vjs: Vec<VjSpec>,
    connections: Vec<(u32, u32, u32)>,
    stop_point_lookup: HashMap<String, u32>,
    line_lookup: HashMap<String, u32>,
    alias: HashMap<String, String>,
    synonyms: HashMap<String, Vec<String>>,
    word_weight: i32,
}

impl NetworkBuilder {
    /// `reference_date` is "YYYYMMDD", day offset 0 of every validity
    /// pattern.
    pub fn new(reference_date: &str) -> Self {
        Self {
            reference_date: NaiveDate::parse_from_str(reference_date, "%Y%m%d")
                .expect("reference date as YYYYMMDD"),
            word_weight: 5,
            ..Default::default()
        }
    }

    pub fn word_weight(&mut self, weight: i32) -> &mut Self {
        self.word_weight = weight;
        self
    }

    pub fn alias(&mut self, from: &str, to: &str) -> &mut Self {
        self.alias.insert(from.to_owned(), to.to_owned());
        self
    }

    pub fn synonym(&mut self, from: &str, expansions: &[&str]) -> &mut Self {
        self.synonyms.insert(
            from.to_owned(),
            expansions.iter().map(|e| (*e).to_owned()).collect(),
        );
        self
    }

    pub fn admin(&mut self, uri: &str, name: &str, coord: Coord) -> u32 {
        let idx = self.admins.len() as u32;
        self.admins.push(Admin {
            idx,
            uri: uri.into(),
            name: name.into(),
            coord,
            admin_list: Vec::new(),
        });
        idx
    }

    /// Registers a stop area together with its single stop point
    /// `stop_point:<uri>`, both carrying the given properties and admins.
    pub fn stop_area(
        &mut self,
        uri: &str,
        name: &str,
        coord: Coord,
        properties: Properties,
        admins: &[u32],
    ) -> u32 {
        let sa_idx = self.stop_areas.len() as u32;
        self.stop_areas.push(StopArea {
            idx: sa_idx,
            uri: uri.into(),
            name: name.into(),
            coord,
            admin_list: admins.to_vec(),
        });
        let sp_idx = self.stop_points.len() as u32;
        let sp_uri = format!("stop_point:{uri}");
        self.stop_points.push(StopPoint {
            idx: sp_idx,
            uri: sp_uri.as_str().into(),
            name: name.into(),
            coord,
            admin_list: admins.to_vec(),
            stop_area_idx: sa_idx,
            properties,
        });
        self.stop_point_lookup.insert(sp_uri, sp_idx);
        sa_idx
    }

    pub fn poi(&mut self, uri: &str, name: &str, coord: Coord, weight: i32, admins: &[u32]) -> u32 {
        let idx = self.pois.len() as u32;
        self.pois.push(Poi {
            idx,
            uri: uri.into(),
            name: name.into(),
            coord,
            admin_list: admins.to_vec(),
            weight,
        });
        idx
    }

    pub fn way(
        &mut self,
        uri: &str,
        name: &str,
        admins: &[u32],
        house_numbers: &[(u32, Coord)],
    ) -> u32 {
        let idx = self.ways.len() as u32;
        let mut numbers: Vec<HouseNumber> = house_numbers
            .iter()
            .map(|(number, coord)| HouseNumber {
                number: *number,
                coord: *coord,
            })
            .collect();
        numbers.sort_by_key(|hn| hn.number);
        let coord = numbers.first().map(|hn| hn.coord).unwrap_or_default();
        self.ways.push(Way {
            idx,
            uri: uri.into(),
            name: name.into(),
            coord,
            admin_list: admins.to_vec(),
            house_numbers: numbers,
        });
        idx
    }

    pub fn line(&mut self, uri: &str, name: &str) -> u32 {
        if let Some(idx) = self.line_lookup.get(uri) {
            return *idx;
        }
        let idx = self.lines.len() as u32;
        self.lines.push(Line {
            idx,
            uri: uri.into(),
            name: name.into(),
            coord: Coord::default(),
            admin_list: Vec::new(),
        });
        self.line_lookup.insert(uri.to_owned(), idx);
        idx
    }

    /// Starts a vehicle journey on `line_uri` (created on the fly when
    /// unknown) valid on `days` ("1" per valid day offset). Chain
    /// [`VehicleJourneyBuilder::st`] calls for its stops.
    pub fn vj(
        &mut self,
        line_uri: &str,
        uri: &str,
        days: &str,
        vehicle_properties: VehicleProperties,
    ) -> VehicleJourneyBuilder<'_> {
        let line_idx = self.line(line_uri, line_uri);
        self.vjs.push(VjSpec {
            uri: uri.to_owned(),
            line_idx,
            days: days.to_owned(),
            vehicle_properties,
            frequency: None,
            stops: Vec::new(),
        });
        VehicleJourneyBuilder { builder: self }
    }

    pub fn connection(&mut self, from_sp_uri: &str, to_sp_uri: &str, duration: u32) -> &mut Self {
        let from = self.stop_point_idx(from_sp_uri);
        let to = self.stop_point_idx(to_sp_uri);
        self.connections.push((from, to, duration));
        self
    }

    fn stop_point_idx(&self, uri: &str) -> u32 {
        *self
            .stop_point_lookup
            .get(uri)
            .unwrap_or_else(|| panic!("unknown stop point {uri}"))
    }

    /// Freezes everything into a query-ready snapshot: groups trips sharing a
    /// stop sequence into journey patterns, lays out stop times and validity
    /// patterns, then rebuilds the derived structures.
    pub fn build(self) -> Data {
        let mut journey_patterns: Vec<JourneyPattern> = Vec::new();
        let mut journey_pattern_points: Vec<JourneyPatternPoint> = Vec::new();
        let mut vehicle_journeys: Vec<VehicleJourney> = Vec::new();
        let mut stop_times: Vec<StopTime> = Vec::new();
        let mut validity_patterns: Vec<ValidityPattern> = Vec::new();
        let mut vp_lookup: HashMap<String, u32> = HashMap::new();
        let mut jp_lookup: HashMap<Vec<u32>, u32> = HashMap::new();

        for spec in &self.vjs {
            let sequence: Vec<u32> = spec.stops.iter().map(|s| s.stop_point_idx).collect();
            let jp_idx = *jp_lookup.entry(sequence.clone()).or_insert_with(|| {
                let jp_idx = journey_patterns.len() as u32;
                let jpp_idxs: Vec<u32> = sequence
                    .iter()
                    .enumerate()
                    .map(|(order, sp_idx)| {
                        let jpp_idx = journey_pattern_points.len() as u32;
                        journey_pattern_points.push(JourneyPatternPoint {
                            idx: jpp_idx,
                            journey_pattern_idx: jp_idx,
                            stop_point_idx: *sp_idx,
                            order: order as u32,
                        });
                        jpp_idx
                    })
                    .collect();
                journey_patterns.push(JourneyPattern {
                    idx: jp_idx,
                    uri: format!("journey_pattern:{jp_idx}").as_str().into(),
                    jpp_idxs: jpp_idxs.into(),
                });
                jp_idx
            });

            let vp_idx = *vp_lookup.entry(spec.days.clone()).or_insert_with(|| {
                let vp_idx = validity_patterns.len() as u32;
                validity_patterns.push(ValidityPattern::from_days(&spec.days));
                vp_idx
            });

            let vj_idx = vehicle_journeys.len() as u32;
            let first_departure = spec.stops.first().map(|s| s.departure).unwrap_or(0);
            let jp = &journey_patterns[jp_idx as usize];
            let stop_time_idxs: Vec<u32> = spec
                .stops
                .iter()
                .enumerate()
                .map(|(order, stop)| {
                    let st_idx = stop_times.len() as u32;
                    let frequency = spec.frequency.map(|(start, end, headway)| {
                        let shift = stop.departure - first_departure;
                        Frequency {
                            start_time: start + shift,
                            end_time: end + shift,
                            headway_secs: headway,
                        }
                    });
                    stop_times.push(StopTime {
                        idx: st_idx,
                        vehicle_journey_idx: vj_idx,
                        journey_pattern_point_idx: jp.jpp_idxs[order],
                        departure_time: stop.departure,
                        arrival_time: stop.arrival,
                        pick_up_allowed: stop.pick_up_allowed,
                        drop_off_allowed: stop.drop_off_allowed,
                        frequency,
                        departure_vp_idx: vp_idx,
                        arrival_vp_idx: vp_idx,
                    });
                    st_idx
                })
                .collect();

            vehicle_journeys.push(VehicleJourney {
                idx: vj_idx,
                uri: spec.uri.as_str().into(),
                journey_pattern_idx: jp_idx,
                line_idx: spec.line_idx,
                vehicle_properties: spec.vehicle_properties,
                stop_time_idxs: stop_time_idxs.into(),
            });
        }

        let mut connections: Vec<Vec<Connection>> = vec![Vec::new(); self.stop_points.len()];
        for (from, to, duration) in &self.connections {
            connections[*from as usize].push(Connection {
                to_stop_point_idx: *to,
                duration: *duration,
            });
        }

        let mut data = Data {
            stop_areas: self.stop_areas.into(),
            stop_points: self.stop_points.into(),
            admins: self.admins.into(),
            pois: self.pois.into(),
            ways: self.ways.into(),
            lines: self.lines.into(),
            journey_patterns: journey_patterns.into(),
            journey_pattern_points: journey_pattern_points.into(),
            vehicle_journeys: vehicle_journeys.into(),
            stop_times: stop_times.into(),
            validity_patterns: validity_patterns.into(),
            connections: connections.into_iter().map(Into::into).collect(),
            reference_date: self.reference_date,
            alias: self.alias,
            synonyms: self.synonyms,
            word_weight: self.word_weight,
            ..Default::default()
        };
        data.rebuild();
        data
    }
}

pub struct VehicleJourneyBuilder<'b> {
    builder: &'b mut NetworkBuilder,
}

impl VehicleJourneyBuilder<'_> {
    fn spec(&mut self) -> &mut VjSpec {
        self.builder.vjs.last_mut().expect("open vehicle journey")
    }

    /// Adds a stop with equal arrival and departure, boardable both ways.
    pub fn st(self, sp_uri: &str, time: &str) -> Self {
        let seconds = hms(time);
        self.st_full(sp_uri, seconds, seconds, true, true)
    }

    pub fn st_arr_dep(self, sp_uri: &str, arrival: &str, departure: &str) -> Self {
        self.st_full(sp_uri, hms(arrival), hms(departure), true, true)
    }

    pub fn st_flags(self, sp_uri: &str, time: &str, pick_up: bool, drop_off: bool) -> Self {
        let seconds = hms(time);
        self.st_full(sp_uri, seconds, seconds, pick_up, drop_off)
    }

    pub fn st_full(
        mut self,
        sp_uri: &str,
        arrival: u32,
        departure: u32,
        pick_up_allowed: bool,
        drop_off_allowed: bool,
    ) -> Self {
        let stop_point_idx = self.builder.stop_point_idx(sp_uri);
        self.spec().stops.push(StopSpec {
            stop_point_idx,
            arrival,
            departure,
            pick_up_allowed,
            drop_off_allowed,
        });
        self
    }

    /// Turns the journey into a frequency trip over `[start, end]` with the
    /// given headway; the window shifts along the trip's relative schedule.
    pub fn frequency(mut self, start: &str, end: &str, headway_secs: u32) -> Self {
        let window = (hms(start), hms(end), headway_secs);
        self.spec().frequency = Some(window);
        self
    }
}

#[test]
fn hms_parses_both_shapes() {
    assert_eq!(hms("8:00"), 8 * 3600);
    assert_eq!(hms("8:00:30"), 8 * 3600 + 30);
    assert_eq!(hms("23:59:59"), 86_399);
}
