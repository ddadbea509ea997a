use ravel::model::builder::NetworkBuilder;
use ravel::model::{
    AccessibilityParams, Data, JourneyPatternPoint, Properties, VehicleProperties,
};
use ravel::routing::{best_stop_time, earliest_stop_time, tardiest_stop_time};
use ravel::shared::datetime::DateTime;
use ravel::shared::geo::Coord;

const EVERY_DAY: &str = "11111111";

/// Two stops, one pattern, two trips: 8:00 -> 9:00 without wheelchair
/// access, 9:00 -> 10:00 with. A third pattern reaches C, whose stop point
/// is not wheelchair accessible.
fn network() -> Data {
    let mut b = NetworkBuilder::new("20150314");
    let accessible = Properties::WHEELCHAIR_BOARDING;
    b.stop_area("A", "A", Coord::default(), accessible, &[]);
    b.stop_area("B", "B", Coord::default(), accessible, &[]);
    b.stop_area("C", "C", Coord::default(), Properties::default(), &[]);
    b.vj("l1", "vj:1", EVERY_DAY, VehicleProperties::default())
        .st("stop_point:A", "8:00")
        .st("stop_point:B", "9:00");
    b.vj("l2", "vj:2", EVERY_DAY, VehicleProperties::WHEELCHAIR_ACCESSIBLE)
        .st("stop_point:A", "9:00")
        .st("stop_point:B", "10:00");
    b.vj("l3", "vj:3", EVERY_DAY, VehicleProperties::WHEELCHAIR_ACCESSIBLE)
        .st("stop_point:A", "10:00")
        .st("stop_point:C", "11:00");
    b.build()
}

/// The journey-pattern point visiting `sp_uri` on the pattern of `vj_uri`.
fn jpp_of<'d>(data: &'d Data, vj_uri: &str, sp_uri: &str) -> &'d JourneyPatternPoint {
    let sp = data.stop_point_by_uri(sp_uri).unwrap();
    let vj = data
        .vehicle_journeys
        .iter()
        .find(|vj| vj.uri.as_ref() == vj_uri)
        .unwrap();
    data.jpps_by_stop_point_idx(sp.idx)
        .iter()
        .map(|jpp_idx| &data.journey_pattern_points[*jpp_idx as usize])
        .find(|jpp| jpp.journey_pattern_idx == vj.journey_pattern_idx)
        .unwrap()
}

#[test]
fn earliest_picks_first_departure_at_or_after() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:A");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 8 * 3600 + 30 * 60);
    let (st, when) = earliest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert_eq!(st.departure_time, 9 * 3600);
    assert_eq!(when, DateTime::set(0, 9 * 3600));
    assert!(when >= dt);
}

#[test]
fn earliest_accepts_exact_hour() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:A");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 8 * 3600);
    let (st, when) = earliest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert_eq!(st.departure_time, 8 * 3600);
    assert_eq!(when.hour(), st.departure_time);
    assert_eq!(when.date(), 0);
}

#[test]
fn earliest_rolls_over_to_next_day() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:A");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 9 * 3600 + 1);
    let (st, when) = earliest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert_eq!(st.departure_time, 8 * 3600);
    assert_eq!(when, DateTime::set(1, 8 * 3600));
    assert!(when >= dt);
}

#[test]
fn earliest_skips_inaccessible_vehicles() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:A");
    let access = AccessibilityParams::wheelchair();

    let dt = DateTime::set(0, 8 * 3600);
    let (st, when) = earliest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert_eq!(st.departure_time, 9 * 3600);
    assert_eq!(when, DateTime::set(0, 9 * 3600));
}

#[test]
fn inaccessible_stop_point_short_circuits() {
    let data = network();
    let jpp = jpp_of(&data, "vj:3", "stop_point:C");
    let access = AccessibilityParams::wheelchair();

    // The trip itself is accessible, the stop point is not.
    let dt = DateTime::set(0, 0);
    assert!(earliest_stop_time(&data, jpp, dt, &access, false).is_none());
    assert!(tardiest_stop_time(&data, jpp, DateTime::set(0, 23 * 3600), &access, false).is_none());
}

#[test]
fn no_valid_day_means_no_trip() {
    let mut b = NetworkBuilder::new("20150314");
    b.stop_area("A", "A", Coord::default(), Properties::default(), &[]);
    b.stop_area("B", "B", Coord::default(), Properties::default(), &[]);
    // Only the reference day runs.
    b.vj("l1", "vj:once", "1", VehicleProperties::default())
        .st("stop_point:A", "8:00")
        .st("stop_point:B", "9:00");
    let data = b.build();
    let jpp = jpp_of(&data, "vj:once", "stop_point:A");
    let access = AccessibilityParams::default();

    // Day 1 is invalid and so is day 2; the rollover is tried exactly once.
    let dt = DateTime::set(1, 7 * 3600);
    assert!(earliest_stop_time(&data, jpp, dt, &access, false).is_none());
}

#[test]
fn tardiest_picks_last_arrival_at_or_before() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:B");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 10 * 3600 + 30 * 60);
    let (st, when) = tardiest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert_eq!(st.arrival_time, 10 * 3600);
    assert_eq!(when, DateTime::set(0, 10 * 3600));
    assert!(when <= dt);
}

#[test]
fn tardiest_accepts_exact_hour() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:B");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 9 * 3600);
    let (st, when) = tardiest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert_eq!(st.arrival_time, 9 * 3600);
    assert_eq!(when.hour(), st.arrival_time);
}

#[test]
fn tardiest_rolls_back_to_previous_day() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:B");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(1, 8 * 3600);
    let (st, when) = tardiest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert_eq!(st.arrival_time, 10 * 3600);
    assert_eq!(when, DateTime::set(0, 10 * 3600));
    assert!(when <= dt);
}

#[test]
fn tardiest_does_not_roll_back_past_day_zero() {
    let data = network();
    let jpp = jpp_of(&data, "vj:1", "stop_point:B");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 8 * 3600);
    assert!(tardiest_stop_time(&data, jpp, dt, &access, false).is_none());
}

#[test]
fn pick_up_and_drop_off_roles() {
    let mut b = NetworkBuilder::new("20150314");
    b.stop_area("A", "A", Coord::default(), Properties::default(), &[]);
    b.stop_area("B", "B", Coord::default(), Properties::default(), &[]);
    b.vj("l1", "vj:droponly", EVERY_DAY, VehicleProperties::default())
        .st("stop_point:A", "8:00")
        .st_flags("stop_point:B", "9:00", false, true);
    let data = b.build();
    let access = AccessibilityParams::default();
    let jpp_b = jpp_of(&data, "vj:droponly", "stop_point:B");

    // Outbound boarding needs pickup, which B refuses.
    let dt = DateTime::set(0, 8 * 3600);
    assert!(earliest_stop_time(&data, jpp_b, dt, &access, false).is_none());
    // Path reconstruction checks drop-off instead.
    assert!(earliest_stop_time(&data, jpp_b, dt, &access, true).is_some());
    // The backward kernel inverts the roles: drop-off on the outbound pass.
    let dt = DateTime::set(0, 10 * 3600);
    assert!(tardiest_stop_time(&data, jpp_b, dt, &access, false).is_some());
    assert!(tardiest_stop_time(&data, jpp_b, dt, &access, true).is_none());
}

fn frequency_network() -> Data {
    let mut b = NetworkBuilder::new("20150314");
    b.stop_area("A", "A", Coord::default(), Properties::default(), &[]);
    b.stop_area("B", "B", Coord::default(), Properties::default(), &[]);
    // Every 10 minutes between 8:00 and 10:00, 30 minutes of ride.
    b.vj("f1", "vj:freq", EVERY_DAY, VehicleProperties::default())
        .st("stop_point:A", "8:00")
        .st("stop_point:B", "8:30")
        .frequency("8:00", "10:00", 600);
    b.build()
}

#[test]
fn frequency_boarding_snaps_to_headway() {
    let data = frequency_network();
    let jpp = jpp_of(&data, "vj:freq", "stop_point:A");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 8 * 3600 + 5 * 60);
    let (st, when) = earliest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert!(st.is_frequency());
    assert_eq!(when, DateTime::set(0, 8 * 3600 + 10 * 60));
    assert!(when >= dt);
}

#[test]
fn frequency_boarding_before_window_takes_first_departure() {
    let data = frequency_network();
    let jpp = jpp_of(&data, "vj:freq", "stop_point:A");
    let access = AccessibilityParams::default();

    let dt = DateTime::set(0, 7 * 3600);
    let (st, when) = earliest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert!(st.is_frequency());
    assert_eq!(when, DateTime::set(0, 8 * 3600));
}

#[test]
fn frequency_trip_running_one_day_only_is_not_boarded_mid_window() {
    let mut b = NetworkBuilder::new("20150314");
    b.stop_area("A", "A", Coord::default(), Properties::default(), &[]);
    b.stop_area("B", "B", Coord::default(), Properties::default(), &[]);
    // Only the reference day runs.
    b.vj("f1", "vj:freq:once", "1", VehicleProperties::default())
        .st("stop_point:A", "8:00")
        .st("stop_point:B", "8:30")
        .frequency("8:00", "10:00", 600);
    let data = b.build();
    let jpp = jpp_of(&data, "vj:freq:once", "stop_point:A");
    let access = AccessibilityParams::default();

    // Frequency slots sort with key zero, so a mid-window hour lands past
    // them; the only other attempt is the rollover, and day 1 is invalid.
    let dt = DateTime::set(0, 8 * 3600 + 5 * 60);
    assert!(earliest_stop_time(&data, jpp, dt, &access, false).is_none());

    // From midnight the scan reaches the slot on the valid day itself.
    let dt = DateTime::set(0, 0);
    let (st, when) = earliest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert!(st.is_frequency());
    assert_eq!(when, DateTime::set(0, 8 * 3600));
}

#[test]
fn frequency_arrival_snaps_back_to_headway() {
    let data = frequency_network();
    let jpp = jpp_of(&data, "vj:freq", "stop_point:B");
    let access = AccessibilityParams::default();

    // Arrival window at B runs 8:30..10:30.
    let dt = DateTime::set(0, 9 * 3600 + 5 * 60);
    let (st, when) = tardiest_stop_time(&data, jpp, dt, &access, false).unwrap();
    assert!(st.is_frequency());
    assert_eq!(when, DateTime::set(0, 9 * 3600));
    assert!(when <= dt);
}

#[test]
fn best_stop_time_dispatches_on_direction() {
    let data = network();
    let access = AccessibilityParams::default();

    let jpp_a = jpp_of(&data, "vj:1", "stop_point:A");
    let dt = DateTime::set(0, 8 * 3600 + 30 * 60);
    let forward = best_stop_time(&data, jpp_a, dt, &access, true, false).unwrap();
    assert_eq!(forward.1, DateTime::set(0, 9 * 3600));

    let jpp_b = jpp_of(&data, "vj:1", "stop_point:B");
    let dt = DateTime::set(0, 9 * 3600 + 30 * 60);
    let backward = best_stop_time(&data, jpp_b, dt, &access, false, false).unwrap();
    assert_eq!(backward.1, DateTime::set(0, 9 * 3600));
}
