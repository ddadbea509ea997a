mod best_stop_time;
mod isochrone;

pub use best_stop_time::*;
pub use isochrone::*;

use bitvec::prelude::*;
use thiserror::Error;
use tracing::trace;

use crate::model::{AccessibilityParams, Data, StopTime};
use crate::shared::datetime::{DateTime, SECONDS_PER_DAY};

/// Hard cap on label-correction rounds, whatever the request asks for.
pub const MAX_ROUNDS: usize = 15;

#[derive(Error, Debug)]
pub enum Error {
    #[error("place uri does not match any entry")]
    UnknownPlace,
}

/// A planner invocation, already translated to engine terms.
#[derive(Debug, Clone)]
pub struct JourneyQuery {
    /// `(place uri, access duration in seconds)` pairs.
    pub origins: Vec<(String, u32)>,
    pub destinations: Vec<(String, u32)>,
    pub datetime: DateTime,
    /// Depart-after when true, arrive-before when false.
    pub clockwise: bool,
    pub access: AccessibilityParams,
    pub max_duration: u32,
    pub max_transfers: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    PublicTransport,
    Transfer,
}

/// One leg of a journey between two stop points.
#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    /// Set on public-transport sections only.
    pub vehicle_journey_idx: Option<u32>,
    pub from_stop_point_idx: u32,
    pub to_stop_point_idx: u32,
    pub departure: DateTime,
    pub arrival: DateTime,
}

#[derive(Debug, Clone)]
pub struct Journey {
    pub departure: DateTime,
    pub arrival: DateTime,
    pub nb_transfers: u32,
    pub sections: Vec<Section>,
}

/// Back-pointer recorded when a label improves. For a clockwise search the
/// leg is read backward from the destination; for an anti-clockwise search it
/// is read forward from the origin.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Parent {
    Ride {
        vehicle_journey_idx: u32,
        /// The stop point at the other end of the leg.
        other_stop_point_idx: u32,
        departure: DateTime,
        arrival: DateTime,
    },
    Footpath {
        other_stop_point_idx: u32,
        departure: DateTime,
        arrival: DateTime,
    },
}

pub(crate) struct RaptorResult {
    /// Best label per stop point: earliest arrival (clockwise) or latest
    /// departure (anti-clockwise).
    pub best: Vec<Option<DateTime>>,
    /// Round in which the best label was set.
    pub best_round: Vec<usize>,
    /// Flat `[round][stop_point]` back-pointer matrix.
    pub parents: Vec<Option<Parent>>,
}

impl RaptorResult {
    pub(crate) fn parent(&self, round: usize, stop_point_idx: u32) -> Option<Parent> {
        self.parents[round * self.best.len() + stop_point_idx as usize]
    }
}

/// Computes the best journey between the query's origins and destinations.
/// At most one journey is returned; none means the request has no solution.
pub fn journeys(data: &Data, query: &JourneyQuery) -> Result<Vec<Journey>, Error> {
    let origins = resolve_places(data, &query.origins)?;
    let destinations = resolve_places(data, &query.destinations)?;
    if origins.is_empty() || destinations.is_empty() {
        return Ok(Vec::new());
    }

    let (starts, targets) = if query.clockwise {
        (&origins, &destinations)
    } else {
        (&destinations, &origins)
    };
    let result = run_raptor(
        data,
        starts,
        query.datetime,
        &query.access,
        query.clockwise,
        query.max_duration,
        query.max_transfers,
    );

    // Pick the target stop point with the best label, extended by its access
    // duration. Ties resolve on the lower stop-point index.
    let mut best: Option<(DateTime, u32, u32)> = None;
    for (sp_idx, access_duration) in targets {
        let Some(label) = result.best[*sp_idx as usize] else {
            continue;
        };
        let reached = if query.clockwise {
            label.add_seconds(*access_duration)
        } else {
            label.sub_seconds(*access_duration)
        };
        let improves = match best {
            None => true,
            Some((current, _, _)) => {
                if query.clockwise {
                    reached < current
                } else {
                    reached > current
                }
            }
        };
        if improves {
            best = Some((reached, *sp_idx, *access_duration));
        }
    }

    let Some((_, target_sp, _)) = best else {
        return Ok(Vec::new());
    };

    let sections = backtrack(
        &result,
        target_sp,
        result.best_round[target_sp as usize],
        query.clockwise,
    );
    if sections.is_empty() {
        return Ok(Vec::new());
    }
    let nb_transfers = (sections
        .iter()
        .filter(|s| s.kind == SectionKind::PublicTransport)
        .count() as u32)
        .saturating_sub(1);
    Ok(vec![Journey {
        departure: sections[0].departure,
        arrival: sections[sections.len() - 1].arrival,
        nb_transfers,
        sections,
    }])
}

/// Resolves each place uri to stop points: a stop-area uri expands to its
/// stop points, a stop-point uri stands alone.
pub(crate) fn resolve_places(
    data: &Data,
    places: &[(String, u32)],
) -> Result<Vec<(u32, u32)>, Error> {
    let mut resolved = Vec::new();
    for (uri, access_duration) in places {
        if let Some(sa) = data.stop_area_by_uri(uri) {
            resolved.extend(
                data.stop_points_by_area_idx(sa.idx)
                    .iter()
                    .map(|sp| (*sp, *access_duration)),
            );
        } else if let Some(sp) = data.stop_point_by_uri(uri) {
            resolved.push((sp.idx, *access_duration));
        } else {
            return Err(Error::UnknownPlace);
        }
    }
    Ok(resolved)
}

/// The round-based label-correction loop. Each round boards trips through the
/// stop-time kernel from every stop point improved in the previous round,
/// propagates along the boarded patterns, then applies footpaths.
pub(crate) fn run_raptor(
    data: &Data,
    starts: &[(u32, u32)],
    dt: DateTime,
    access: &AccessibilityParams,
    clockwise: bool,
    max_duration: u32,
    max_transfers: u32,
) -> RaptorResult {
    let nb_sp = data.stop_points.len();
    let rounds = ((max_transfers as usize).saturating_add(1)).min(MAX_ROUNDS);
    let bound = if clockwise {
        dt.add_seconds(max_duration)
    } else {
        dt.sub_seconds(max_duration)
    };

    let mut best: Vec<Option<DateTime>> = vec![None; nb_sp];
    let mut best_round: Vec<usize> = vec![0; nb_sp];
    let mut prev: Vec<Option<DateTime>> = vec![None; nb_sp];
    let mut curr: Vec<Option<DateTime>> = vec![None; nb_sp];
    let mut parents: Vec<Option<Parent>> = vec![None; nb_sp * rounds];
    let mut marked = bitvec!(usize, Lsb0; 0; nb_sp);

    for (sp_idx, access_duration) in starts {
        let label = if clockwise {
            dt.add_seconds(*access_duration)
        } else {
            dt.sub_seconds(*access_duration)
        };
        if within(label, bound, clockwise) {
            curr[*sp_idx as usize] = Some(label);
            best[*sp_idx as usize] = Some(label);
            marked.set(*sp_idx as usize, true);
        }
    }

    // Per-journey-pattern boarding position for the current round: the
    // earliest improved order (clockwise) or the latest (anti-clockwise).
    let mut active_order: Vec<Option<u32>> = vec![None; data.journey_patterns.len()];

    for round in 0..rounds {
        std::mem::swap(&mut prev, &mut curr);
        curr.fill(None);

        if marked.not_any() {
            break;
        }
        trace!("round {round}: {} marked stop points", marked.count_ones());

        let mut touched_jps: Vec<u32> = Vec::new();
        for sp_idx in marked.iter_ones() {
            for jpp_idx in data.jpps_by_stop_point_idx(sp_idx as u32) {
                let jpp = &data.journey_pattern_points[*jpp_idx as usize];
                let slot = &mut active_order[jpp.journey_pattern_idx as usize];
                match slot {
                    None => {
                        *slot = Some(jpp.order);
                        touched_jps.push(jpp.journey_pattern_idx);
                    }
                    Some(order) => {
                        if (clockwise && jpp.order < *order) || (!clockwise && jpp.order > *order)
                        {
                            *order = jpp.order;
                        }
                    }
                }
            }
        }
        touched_jps.sort_unstable();
        marked.fill(false);

        for jp_idx in &touched_jps {
            let from_order = active_order[*jp_idx as usize].take().unwrap_or(0);
            explore_pattern(
                data,
                *jp_idx,
                from_order,
                clockwise,
                access,
                bound,
                round,
                &prev,
                &mut curr,
                &mut best,
                &mut best_round,
                &mut parents,
                &mut marked,
            );
        }

        explore_footpaths(
            data,
            clockwise,
            bound,
            round,
            &mut curr,
            &mut best,
            &mut best_round,
            &mut parents,
            &mut marked,
        );
    }

    RaptorResult {
        best,
        best_round,
        parents,
    }
}

struct Boarded<'d> {
    vehicle_journey_idx: u32,
    /// Stop time at the boarding (clockwise) or alighting (anti-clockwise)
    /// position.
    st: &'d StopTime,
    stop_point_idx: u32,
    /// Actual departure (clockwise) or arrival (anti-clockwise) instant.
    dt: DateTime,
}

/// Time of the boarded trip at another position of its pattern. Frequency
/// trips shift by their relative schedule; concrete trips carry the date
/// through `update`.
fn onboard_time(boarded: &Boarded<'_>, st: &StopTime, departure: bool, clockwise: bool) -> DateTime {
    let hour = if departure {
        st.departure_time
    } else {
        st.arrival_time
    };
    if boarded.st.is_frequency() {
        let base = if clockwise {
            boarded.st.departure_time
        } else {
            boarded.st.arrival_time
        };
        let offset = (hour + SECONDS_PER_DAY - base) % SECONDS_PER_DAY;
        if clockwise {
            boarded.dt.add_seconds(offset)
        } else {
            boarded
                .dt
                .sub_seconds((base + SECONDS_PER_DAY - hour) % SECONDS_PER_DAY)
        }
    } else {
        let mut dt = boarded.dt;
        dt.update(hour, clockwise);
        dt
    }
}

#[allow(clippy::too_many_arguments)]
fn explore_pattern(
    data: &Data,
    jp_idx: u32,
    from_order: u32,
    clockwise: bool,
    access: &AccessibilityParams,
    bound: DateTime,
    round: usize,
    prev: &[Option<DateTime>],
    curr: &mut [Option<DateTime>],
    best: &mut [Option<DateTime>],
    best_round: &mut [usize],
    parents: &mut [Option<Parent>],
    marked: &mut BitSlice<usize, Lsb0>,
) {
    let jp = &data.journey_patterns[jp_idx as usize];
    let nb_sp = curr.len();
    let mut onboard: Option<Boarded<'_>> = None;

    let orders: Box<dyn Iterator<Item = u32>> = if clockwise {
        Box::new(from_order..jp.jpp_idxs.len() as u32)
    } else {
        Box::new((0..=from_order).rev())
    };

    for order in orders {
        let jpp = &data.journey_pattern_points[jp.jpp_idxs[order as usize] as usize];
        let sp_idx = jpp.stop_point_idx;

        // Propagate the trip we are on.
        if let Some(boarded) = &onboard {
            let vj = &data.vehicle_journeys[boarded.vehicle_journey_idx as usize];
            let st = &data.stop_times[vj.stop_time_idxs[order as usize] as usize];
            let reached = onboard_time(boarded, st, !clockwise, clockwise);
            let exit_allowed = if clockwise {
                st.drop_off_allowed
            } else {
                st.pick_up_allowed
            };
            if exit_allowed
                && data.stop_points[sp_idx as usize].accessible(access.properties)
                && within(reached, bound, clockwise)
                && improves(best[sp_idx as usize], reached, clockwise)
            {
                curr[sp_idx as usize] = Some(reached);
                best[sp_idx as usize] = Some(reached);
                best_round[sp_idx as usize] = round;
                parents[round * nb_sp + sp_idx as usize] = Some(Parent::Ride {
                    vehicle_journey_idx: boarded.vehicle_journey_idx,
                    other_stop_point_idx: boarded.stop_point_idx,
                    departure: if clockwise { boarded.dt } else { reached },
                    arrival: if clockwise { reached } else { boarded.dt },
                });
                marked.set(sp_idx as usize, true);
            }
        }

        // Try to catch a better trip from this position, using the previous
        // round's label.
        if let Some(label) = prev[sp_idx as usize] {
            let current_edge = onboard.as_ref().map(|boarded| {
                let vj = &data.vehicle_journeys[boarded.vehicle_journey_idx as usize];
                let st = &data.stop_times[vj.stop_time_idxs[order as usize] as usize];
                onboard_time(boarded, st, clockwise, clockwise)
            });
            let worth_trying = match current_edge {
                None => true,
                Some(edge) => {
                    if clockwise {
                        label <= edge
                    } else {
                        label >= edge
                    }
                }
            };
            if worth_trying
                && let Some((st, dt)) = best_stop_time(data, jpp, label, access, clockwise, false)
                && within(dt, bound, clockwise)
                && match current_edge {
                    None => true,
                    Some(edge) => {
                        if clockwise {
                            dt < edge
                        } else {
                            dt > edge
                        }
                    }
                }
            {
                onboard = Some(Boarded {
                    vehicle_journey_idx: st.vehicle_journey_idx,
                    st,
                    stop_point_idx: sp_idx,
                    dt,
                });
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn explore_footpaths(
    data: &Data,
    clockwise: bool,
    bound: DateTime,
    round: usize,
    curr: &mut [Option<DateTime>],
    best: &mut [Option<DateTime>],
    best_round: &mut [usize],
    parents: &mut [Option<Parent>],
    marked: &mut BitSlice<usize, Lsb0>,
) {
    let nb_sp = curr.len();
    let improved: Vec<usize> = marked.iter_ones().collect();
    for sp_idx in improved {
        let Some(label) = curr[sp_idx] else { continue };
        for connection in data.connections[sp_idx].iter() {
            let to = connection.to_stop_point_idx as usize;
            let reached = if clockwise {
                label.add_seconds(connection.duration)
            } else {
                label.sub_seconds(connection.duration)
            };
            if within(reached, bound, clockwise) && improves(best[to], reached, clockwise) {
                curr[to] = Some(reached);
                best[to] = Some(reached);
                best_round[to] = round;
                parents[round * nb_sp + to] = Some(Parent::Footpath {
                    other_stop_point_idx: sp_idx as u32,
                    departure: if clockwise { label } else { reached },
                    arrival: if clockwise { reached } else { label },
                });
                marked.set(to, true);
            }
        }
    }
}

const fn within(label: DateTime, bound: DateTime, clockwise: bool) -> bool {
    if clockwise {
        label.total_seconds() <= bound.total_seconds()
    } else {
        label.total_seconds() >= bound.total_seconds()
    }
}

fn improves(current: Option<DateTime>, candidate: DateTime, clockwise: bool) -> bool {
    match current {
        None => true,
        Some(current) => {
            if clockwise {
                candidate < current
            } else {
                candidate > current
            }
        }
    }
}

/// Unwinds the back-pointers from the reached target into chronological
/// sections. A ride consumes a round; footpaths stay within theirs. For a
/// clockwise search the walk runs destination to origin; anti-clockwise it
/// runs origin to destination and is already chronological.
fn backtrack(
    result: &RaptorResult,
    target_sp: u32,
    target_round: usize,
    clockwise: bool,
) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut sp = target_sp;
    let mut round = target_round;

    loop {
        let Some(parent) = result.parent(round, sp) else {
            break;
        };
        match parent {
            Parent::Ride {
                vehicle_journey_idx,
                other_stop_point_idx,
                departure,
                arrival,
            } => {
                let (from, to) = if clockwise {
                    (other_stop_point_idx, sp)
                } else {
                    (sp, other_stop_point_idx)
                };
                sections.push(Section {
                    kind: SectionKind::PublicTransport,
                    vehicle_journey_idx: Some(vehicle_journey_idx),
                    from_stop_point_idx: from,
                    to_stop_point_idx: to,
                    departure,
                    arrival,
                });
                sp = other_stop_point_idx;
                if round == 0 {
                    break;
                }
                round -= 1;
            }
            Parent::Footpath {
                other_stop_point_idx,
                departure,
                arrival,
            } => {
                let (from, to) = if clockwise {
                    (other_stop_point_idx, sp)
                } else {
                    (sp, other_stop_point_idx)
                };
                sections.push(Section {
                    kind: SectionKind::Transfer,
                    vehicle_journey_idx: None,
                    from_stop_point_idx: from,
                    to_stop_point_idx: to,
                    departure,
                    arrival,
                });
                sp = other_stop_point_idx;
            }
        }
    }

    if clockwise {
        sections.reverse();
    }
    sections
}
