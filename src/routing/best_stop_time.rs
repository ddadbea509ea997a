use crate::model::{
    AccessibilityParams, Data, JourneyPatternPoint, StopTime, VehicleProperties,
    f_arrival_time, f_departure_time,
};
use crate::shared::datetime::{DateTime, SECONDS_PER_DAY};

/// Resolves the best boarding (clockwise) or alighting (anti-clockwise)
/// opportunity at a journey-pattern point from a reference instant.
///
/// Returns `None` when no compatible trip exists.
pub fn best_stop_time<'d>(
    data: &'d Data,
    jpp: &JourneyPatternPoint,
    dt: DateTime,
    access: &AccessibilityParams,
    clockwise: bool,
    reconstructing_path: bool,
) -> Option<(&'d StopTime, DateTime)> {
    if clockwise {
        earliest_stop_time(data, jpp, dt, access, reconstructing_path)
    } else {
        tardiest_stop_time(data, jpp, dt, access, reconstructing_path)
    }
}

/// First stop time in `[idx, end)` of the departure-sorted table that can be
/// picked up at `hour` on `date`.
fn valid_pick_up<'d>(
    data: &'d Data,
    mut idx: usize,
    end: usize,
    date: u32,
    hour: u32,
    reconstructing_path: bool,
    required: VehicleProperties,
) -> Option<&'d StopTime> {
    while idx < end {
        let st = &data.stop_times[data.timetable.st_idx_forward[idx] as usize];
        if data.validity_patterns[st.departure_vp_idx as usize].check(date)
            && st.valid_end(reconstructing_path)
            && st.valid_hour(hour, true)
            && data.vehicle_journeys[st.vehicle_journey_idx as usize].accessible(required)
        {
            return Some(st);
        }
        idx += 1;
    }
    None
}

/// Mirror of [`valid_pick_up`] over the arrival-sorted table: the table is
/// ascending, so walking downward in time means scanning `[begin, from)` in
/// reverse.
fn valid_drop_off<'d>(
    data: &'d Data,
    begin: usize,
    from: usize,
    date: u32,
    hour: u32,
    reconstructing_path: bool,
    required: VehicleProperties,
) -> Option<&'d StopTime> {
    let mut idx = from;
    while idx > begin {
        idx -= 1;
        let st = &data.stop_times[data.timetable.st_idx_backward[idx] as usize];
        if data.validity_patterns[st.arrival_vp_idx as usize].check(date)
            && st.valid_end(!reconstructing_path)
            && st.valid_hour(hour, false)
            && data.vehicle_journeys[st.vehicle_journey_idx as usize].accessible(required)
        {
            return Some(st);
        }
    }
    None
}

/// Next valid departure at `jpp` at or after `dt`.
///
/// Binary-searches the departure-sorted segment for the reference hour, then
/// scans forward filtering on calendar, boarding role, frequency window and
/// vehicle accessibility. When today yields nothing the next day is tried
/// once from midnight.
pub fn earliest_stop_time<'d>(
    data: &'d Data,
    jpp: &JourneyPatternPoint,
    dt: DateTime,
    access: &AccessibilityParams,
    reconstructing_path: bool,
) -> Option<(&'d StopTime, DateTime)> {
    // A stop point that lacks the required properties invalidates the whole
    // journey-pattern point, before any table lookup.
    if !data.stop_points[jpp.stop_point_idx as usize].accessible(access.properties) {
        return None;
    }

    let (begin, end) = data.timetable.segment(jpp.journey_pattern_idx, jpp.order);
    let segment = &data.timetable.departure_times[begin..end];
    let idx = begin + segment.partition_point(|&departure| departure < dt.hour());

    let mut first_st = valid_pick_up(
        data,
        idx,
        end,
        dt.date(),
        dt.hour(),
        reconstructing_path,
        access.vehicle_properties,
    );
    let mut working_dt = dt;
    // Nothing left today: try the day after, from midnight.
    if first_st.is_none() {
        working_dt = DateTime::set(dt.date() + 1, 0);
        first_st = valid_pick_up(
            data,
            begin,
            end,
            working_dt.date(),
            0,
            reconstructing_path,
            access.vehicle_properties,
        );
    }

    let st = first_st?;
    if !st.is_frequency() {
        working_dt.update(st.departure_time, true);
    } else {
        working_dt = dt;
        working_dt.update(f_departure_time(dt.hour(), st), true);
    }
    Some((st, working_dt))
}

/// Latest valid arrival at `jpp` at or before `dt`. Symmetric to
/// [`earliest_stop_time`]; the previous day is only tried while there is one.
pub fn tardiest_stop_time<'d>(
    data: &'d Data,
    jpp: &JourneyPatternPoint,
    dt: DateTime,
    access: &AccessibilityParams,
    reconstructing_path: bool,
) -> Option<(&'d StopTime, DateTime)> {
    if !data.stop_points[jpp.stop_point_idx as usize].accessible(access.properties) {
        return None;
    }

    let (begin, end) = data.timetable.segment(jpp.journey_pattern_idx, jpp.order);
    let segment = &data.timetable.arrival_times[begin..end];
    // First slot arriving after the reference hour; everything below it is a
    // candidate, latest first.
    let from = begin + segment.partition_point(|&arrival| arrival <= dt.hour());

    let mut first_st = valid_drop_off(
        data,
        begin,
        from,
        dt.date(),
        dt.hour(),
        reconstructing_path,
        access.vehicle_properties,
    );
    let mut working_dt = dt;
    if first_st.is_none() && dt.date() > 0 {
        working_dt = DateTime::set(dt.date() - 1, SECONDS_PER_DAY - 1);
        first_st = valid_drop_off(
            data,
            begin,
            end,
            working_dt.date(),
            SECONDS_PER_DAY - 1,
            reconstructing_path,
            access.vehicle_properties,
        );
    }

    let st = first_st?;
    if !st.is_frequency() {
        working_dt.update(st.arrival_time, false);
    } else {
        working_dt = dt;
        working_dt.update(f_arrival_time(dt.hour(), st), false);
    }
    Some((st, working_dt))
}
