use std::sync::Arc;

use crate::model::calendar::VehicleProperties;

/// An ordered abstract sequence of stop-point visits shared by a family of
/// trips.
#[derive(Debug, Default, Clone)]
pub struct JourneyPattern {
    pub idx: u32,
    pub uri: Arc<str>,
    /// Journey-pattern-point indices, by order.
    pub jpp_idxs: Box<[u32]>,
}

/// One position within a journey pattern, bound to a concrete stop point.
#[derive(Debug, Default, Clone)]
pub struct JourneyPatternPoint {
    pub idx: u32,
    pub journey_pattern_idx: u32,
    pub stop_point_idx: u32,
    /// 0-based position in the pattern.
    pub order: u32,
}

/// A concrete trip realizing a journey pattern on specific days.
#[derive(Debug, Default, Clone)]
pub struct VehicleJourney {
    pub idx: u32,
    pub uri: Arc<str>,
    pub journey_pattern_idx: u32,
    /// Line the trip is marketed under.
    pub line_idx: u32,
    pub vehicle_properties: VehicleProperties,
    /// Stop-time indices, one per journey-pattern point, in pattern order.
    pub stop_time_idxs: Box<[u32]>,
}

impl VehicleJourney {
    pub const fn accessible(&self, required: VehicleProperties) -> bool {
        self.vehicle_properties.supports(required)
    }
}

/// The `(headway, start, end)` window of a frequency trip: the vehicle leaves
/// every `headway_secs` seconds between `start_time` and `end_time` instead of
/// at a fixed timetable.
#[derive(Debug, Clone, Copy)]
pub struct Frequency {
    pub start_time: u32,
    pub end_time: u32,
    pub headway_secs: u32,
}

/// The arrival/departure pair for one (vehicle journey, journey-pattern
/// point) cell.
#[derive(Debug, Default, Clone)]
pub struct StopTime {
    pub idx: u32,
    pub vehicle_journey_idx: u32,
    pub journey_pattern_point_idx: u32,
    /// Seconds within day.
    pub departure_time: u32,
    pub arrival_time: u32,
    pub pick_up_allowed: bool,
    pub drop_off_allowed: bool,
    /// Present on frequency trips only.
    pub frequency: Option<Frequency>,
    /// Validity-pattern indices for the departure and arrival events.
    pub departure_vp_idx: u32,
    pub arrival_vp_idx: u32,
}

impl StopTime {
    pub const fn is_frequency(&self) -> bool {
        self.frequency.is_some()
    }

    /// Whether this stop time serves the requested end of a leg: pickup on
    /// the outbound pass, drop-off when reconstructing a path.
    pub const fn valid_end(&self, reconstructing_path: bool) -> bool {
        if reconstructing_path {
            self.drop_off_allowed
        } else {
            self.pick_up_allowed
        }
    }

    /// Whether `hour` is servable by this stop time in the given direction.
    /// Frequency trips answer against their window, concrete trips against
    /// their fixed times.
    pub const fn valid_hour(&self, hour: u32, forward: bool) -> bool {
        match self.frequency {
            None => {
                if forward {
                    hour <= self.departure_time
                } else {
                    self.arrival_time <= hour
                }
            }
            Some(f) => {
                if forward {
                    hour <= f.end_time
                } else {
                    f.start_time <= hour
                }
            }
        }
    }
}

/// Next departure of a frequency stop time at or after `hour`, stepped by the
/// headway from the start of the window.
pub fn f_departure_time(hour: u32, st: &StopTime) -> u32 {
    let Some(f) = st.frequency else {
        return st.departure_time;
    };
    if hour <= f.start_time {
        f.start_time
    } else {
        f.start_time + (hour - f.start_time).div_ceil(f.headway_secs) * f.headway_secs
    }
}

/// Latest arrival of a frequency stop time at or before `hour`, stepped back
/// by the headway from the end of the window.
pub fn f_arrival_time(hour: u32, st: &StopTime) -> u32 {
    let Some(f) = st.frequency else {
        return st.arrival_time;
    };
    if hour >= f.end_time {
        f.end_time
    } else {
        f.end_time - (f.end_time - hour).div_ceil(f.headway_secs) * f.headway_secs
    }
}

/// The pre-computed hot tables the stop-time kernel searches.
///
/// For each journey pattern `jp` serving `T` trips over `N` pattern points,
/// `departure_times[first_stop_time[jp] + order*T .. +T]` holds the `T`
/// departure times at that pattern point, sorted ascending, and
/// `st_idx_forward` maps each slot back to its concrete stop time.
/// `arrival_times`/`st_idx_backward` are the arrival-sorted mirror. Frequency
/// stop times sort with key 0 and are reconciled at query time.
#[derive(Debug, Default, Clone)]
pub struct Timetable {
    pub first_stop_time: Box<[u32]>,
    pub nb_trips: Box<[u32]>,
    pub departure_times: Box<[u32]>,
    pub arrival_times: Box<[u32]>,
    pub st_idx_forward: Box<[u32]>,
    pub st_idx_backward: Box<[u32]>,
}

impl Timetable {
    pub fn build(
        journey_patterns: &[JourneyPattern],
        vehicle_journeys: &[VehicleJourney],
        stop_times: &[StopTime],
    ) -> Self {
        let mut jp_to_vjs: Vec<Vec<u32>> = vec![Vec::new(); journey_patterns.len()];
        for vj in vehicle_journeys {
            jp_to_vjs[vj.journey_pattern_idx as usize].push(vj.idx);
        }

        let mut first_stop_time = Vec::with_capacity(journey_patterns.len());
        let mut nb_trips = Vec::with_capacity(journey_patterns.len());
        let mut departure_times = Vec::new();
        let mut arrival_times = Vec::new();
        let mut st_idx_forward = Vec::new();
        let mut st_idx_backward = Vec::new();

        for jp in journey_patterns {
            let vjs = &jp_to_vjs[jp.idx as usize];
            first_stop_time.push(departure_times.len() as u32);
            nb_trips.push(vjs.len() as u32);

            for order in 0..jp.jpp_idxs.len() {
                let mut departures: Vec<(u32, u32)> = Vec::with_capacity(vjs.len());
                let mut arrivals: Vec<(u32, u32)> = Vec::with_capacity(vjs.len());
                for vj_idx in vjs {
                    let vj = &vehicle_journeys[*vj_idx as usize];
                    debug_assert_eq!(vj.stop_time_idxs.len(), jp.jpp_idxs.len());
                    let st_idx = vj.stop_time_idxs[order];
                    let st = &stop_times[st_idx as usize];
                    // Frequency trips sort first; their concrete times only
                    // exist relative to a query hour.
                    let (dep_key, arr_key) = if st.is_frequency() {
                        (0, 0)
                    } else {
                        (st.departure_time, st.arrival_time)
                    };
                    departures.push((dep_key, st_idx));
                    arrivals.push((arr_key, st_idx));
                }
                departures.sort_unstable();
                arrivals.sort_unstable();
                for (key, st_idx) in departures {
                    departure_times.push(key);
                    st_idx_forward.push(st_idx);
                }
                for (key, st_idx) in arrivals {
                    arrival_times.push(key);
                    st_idx_backward.push(st_idx);
                }
            }
        }

        Self {
            first_stop_time: first_stop_time.into(),
            nb_trips: nb_trips.into(),
            departure_times: departure_times.into(),
            arrival_times: arrival_times.into(),
            st_idx_forward: st_idx_forward.into(),
            st_idx_backward: st_idx_backward.into(),
        }
    }

    /// Bounds of the departure/arrival segment for one (journey pattern,
    /// order) cell.
    pub fn segment(&self, jp_idx: u32, order: u32) -> (usize, usize) {
        let trips = self.nb_trips[jp_idx as usize] as usize;
        let begin = self.first_stop_time[jp_idx as usize] as usize + order as usize * trips;
        (begin, begin + trips)
    }
}

#[test]
fn frequency_departure_steps_on_headway() {
    let st = StopTime {
        frequency: Some(Frequency {
            start_time: 8 * 3600,
            end_time: 10 * 3600,
            headway_secs: 600,
        }),
        ..Default::default()
    };
    assert_eq!(f_departure_time(0, &st), 8 * 3600);
    assert_eq!(f_departure_time(8 * 3600, &st), 8 * 3600);
    assert_eq!(f_departure_time(8 * 3600 + 1, &st), 8 * 3600 + 600);
    assert_eq!(f_departure_time(8 * 3600 + 600, &st), 8 * 3600 + 600);
}

#[test]
fn frequency_arrival_steps_back_on_headway() {
    let st = StopTime {
        frequency: Some(Frequency {
            start_time: 8 * 3600,
            end_time: 10 * 3600,
            headway_secs: 600,
        }),
        ..Default::default()
    };
    assert_eq!(f_arrival_time(11 * 3600, &st), 10 * 3600);
    assert_eq!(f_arrival_time(10 * 3600, &st), 10 * 3600);
    assert_eq!(f_arrival_time(10 * 3600 - 1, &st), 10 * 3600 - 600);
}

#[test]
fn valid_hour_concrete_and_frequency() {
    let concrete = StopTime {
        departure_time: 9 * 3600,
        arrival_time: 9 * 3600,
        ..Default::default()
    };
    assert!(concrete.valid_hour(8 * 3600, true));
    assert!(!concrete.valid_hour(10 * 3600, true));
    assert!(concrete.valid_hour(10 * 3600, false));
    assert!(!concrete.valid_hour(8 * 3600, false));

    let freq = StopTime {
        frequency: Some(Frequency {
            start_time: 8 * 3600,
            end_time: 10 * 3600,
            headway_secs: 300,
        }),
        ..Default::default()
    };
    assert!(freq.valid_hour(9 * 3600, true));
    assert!(!freq.valid_hour(11 * 3600, true));
    assert!(freq.valid_hour(9 * 3600, false));
    assert!(!freq.valid_hour(7 * 3600, false));
}
