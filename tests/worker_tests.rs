use std::sync::Arc;

use chrono::NaiveDateTime;

use ravel::model::builder::NetworkBuilder;
use ravel::model::{PlaceType, Properties, VehicleProperties};
use ravel::shared::geo::Coord;
use ravel::worker::{
    Api, DataManager, IsochroneRequest, JourneysRequest, LocationContext, PlacesRequest,
    RealtimeLevel, Request, Response, ResponseType, StreetNetworkParams, Worker,
};

fn ts(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y%m%dT%H%M%S").unwrap()
}

/// Three stop areas; C's stop point is not wheelchair accessible. Trip 8:00
/// -> 9:00 runs without wheelchair access, 9:00 -> 10:00 with, and an
/// accessible 10:00 -> 11:00 trip reaches C.
fn worker() -> Worker {
    let mut b = NetworkBuilder::new("20150314");
    let accessible = Properties::WHEELCHAIR_BOARDING;
    b.stop_area("A", "A", Coord::new(2.3522219, 48.856614), accessible, &[]);
    b.stop_area("B", "B", Coord::new(2.35, 48.853), accessible, &[]);
    b.stop_area("C", "C", Coord::new(2.3461, 48.8463), Properties::default(), &[]);
    b.vj("l1", "vj:l1", "11111111", VehicleProperties::default())
        .st("stop_point:A", "8:00")
        .st("stop_point:B", "9:00");
    b.vj("l2", "vj:l2", "11111111", VehicleProperties::WHEELCHAIR_ACCESSIBLE)
        .st("stop_point:A", "9:00")
        .st("stop_point:B", "10:00");
    b.vj("l3", "vj:l3", "11111111", VehicleProperties::WHEELCHAIR_ACCESSIBLE)
        .st("stop_point:A", "10:00")
        .st("stop_point:C", "11:00");
    Worker::new(Arc::new(DataManager::new(b.build())))
}

fn journeys_request(wheelchair: bool, destination: &str) -> Request {
    Request {
        requested_api: Some(Api::Planner),
        journeys: Some(JourneysRequest {
            clockwise: true,
            wheelchair,
            realtime_level: RealtimeLevel::AdaptedSchedule,
            max_duration: u32::MAX,
            max_transfers: 42,
            datetimes: vec![ts("20150314T080000")],
            streetnetwork_params: StreetNetworkParams::default(),
            origin: vec![LocationContext {
                place: "A".to_owned(),
                access_duration: 0,
            }],
            destination: vec![LocationContext {
                place: destination.to_owned(),
                access_duration: 0,
            }],
        }),
        ..Default::default()
    }
}

fn isochrone_request(max_duration: u32, min_duration: u32, origin: &str) -> Request {
    let mut journeys = match journeys_request(true, "B").journeys {
        Some(journeys) => journeys,
        None => unreachable!(),
    };
    journeys.max_duration = max_duration;
    journeys.destination.clear();
    journeys.origin[0].place = origin.to_owned();
    Request {
        requested_api: Some(Api::GraphicalIsochrone),
        isochrone: Some(IsochroneRequest {
            min_duration,
            journeys_request: journeys,
        }),
        ..Default::default()
    }
}

#[test]
fn no_wheelchair_takes_the_first_trip() {
    let worker = worker();
    let response = worker.dispatch(&journeys_request(false, "B"));
    assert_eq!(response.response_type, ResponseType::ItineraryFound);
    assert_eq!(response.journeys.len(), 1);
    assert_eq!(
        response.journeys[0].arrival_date_time,
        ts("20150314T090000")
    );
}

#[test]
fn wheelchair_waits_for_the_accessible_trip() {
    let worker = worker();
    let response = worker.dispatch(&journeys_request(true, "B"));
    assert_eq!(response.response_type, ResponseType::ItineraryFound);
    assert_eq!(response.journeys.len(), 1);
    assert_eq!(
        response.journeys[0].arrival_date_time,
        ts("20150314T100000")
    );
}

#[test]
fn inaccessible_terminal_has_no_solution() {
    let worker = worker();
    let response = worker.dispatch(&journeys_request(true, "C"));
    assert_eq!(response.response_type, ResponseType::NoSolution);
    assert!(response.journeys.is_empty());
}

#[test]
fn journey_sections_carry_the_ride() {
    let worker = worker();
    let response = worker.dispatch(&journeys_request(false, "B"));
    let journey = &response.journeys[0];
    assert_eq!(journey.nb_transfers, 0);
    assert_eq!(journey.sections.len(), 1);
    let section = &journey.sections[0];
    assert_eq!(section.from, "stop_point:A");
    assert_eq!(section.to, "stop_point:B");
    assert_eq!(section.vehicle_journey.as_deref(), Some("vj:l1"));
    assert_eq!(section.departure_date_time, ts("20150314T080000"));
}

#[test]
fn arrive_before_picks_the_latest_departure() {
    let worker = worker();
    let mut request = journeys_request(false, "B");
    if let Some(journeys) = request.journeys.as_mut() {
        journeys.clockwise = false;
        journeys.datetimes = vec![ts("20150314T103000")];
    }
    let response = worker.dispatch(&request);
    assert_eq!(response.response_type, ResponseType::ItineraryFound);
    let journey = &response.journeys[0];
    assert_eq!(journey.departure_date_time, ts("20150314T090000"));
    assert_eq!(journey.arrival_date_time, ts("20150314T100000"));
}

#[test]
fn isochrone_draws_the_reachable_area() {
    let worker = worker();
    let response = worker.dispatch(&isochrone_request(7200, 0, "A"));
    assert_eq!(response.response_type, ResponseType::ItineraryFound);
    assert_eq!(response.graphical_isochrones.len(), 1);
    let isochrone = &response.graphical_isochrones[0];
    assert!(!isochrone.polygons.is_empty());
    assert!(isochrone.polygons[0].outer.len() > 1);
}

#[test]
fn isochrone_min_duration_carves_a_hole() {
    let worker = worker();
    let response = worker.dispatch(&isochrone_request(7200, 200, "A"));
    assert_eq!(response.response_type, ResponseType::ItineraryFound);
    assert_eq!(response.graphical_isochrones.len(), 1);
    let isochrone = &response.graphical_isochrones[0];
    assert!(!isochrone.polygons.is_empty());
    let mut with_inners = 0;
    for polygon in &isochrone.polygons {
        assert!(polygon.outer.len() > 3);
        for inner in &polygon.inners {
            assert!(inner.len() > 3);
        }
        if !polygon.inners.is_empty() {
            with_inners += 1;
        }
    }
    assert!(with_inners > 0);
}

#[test]
fn places_go_through_the_facade() {
    let worker = worker();
    let response = worker.dispatch(&Request {
        requested_api: Some(Api::Places),
        places: Some(PlacesRequest {
            q: "A".to_owned(),
            filter_types: vec![PlaceType::StopArea],
            depth: 0,
            nbmax: 10,
            admin_uris: Vec::new(),
            search_type: 0,
        }),
        ..Default::default()
    });
    assert_eq!(response.response_type, ResponseType::ItineraryFound);
    assert_eq!(response.places.len(), 1);
    assert_eq!(response.places[0].uri, "A");
    assert!(response.pagination.is_some());
}

#[test]
fn missing_payload_is_no_solution() {
    let worker = worker();
    let response: Response = worker.dispatch(&Request {
        requested_api: Some(Api::Planner),
        ..Default::default()
    });
    assert_eq!(response.response_type, ResponseType::NoSolution);

    let response = worker.dispatch(&Request::default());
    assert_eq!(response.response_type, ResponseType::NoSolution);
}

#[test]
fn datetime_before_the_reference_date_is_no_solution() {
    let worker = worker();
    let mut request = journeys_request(false, "B");
    if let Some(journeys) = request.journeys.as_mut() {
        journeys.datetimes = vec![ts("20150301T080000")];
    }
    let response = worker.dispatch(&request);
    assert_eq!(response.response_type, ResponseType::NoSolution);
}

#[test]
fn unknown_place_is_no_solution() {
    let worker = worker();
    let response = worker.dispatch(&journeys_request(false, "Z"));
    assert_eq!(response.response_type, ResponseType::NoSolution);
}

#[test]
fn snapshot_swap_does_not_disturb_request_shape() {
    let mut b = NetworkBuilder::new("20150314");
    b.stop_area("A", "A", Coord::default(), Properties::default(), &[]);
    b.stop_area("B", "B", Coord::default(), Properties::default(), &[]);
    b.vj("l1", "vj:l1", "11111111", VehicleProperties::default())
        .st("stop_point:A", "8:00")
        .st("stop_point:B", "9:00");
    let manager = Arc::new(DataManager::new(b.build()));
    let worker = Worker::new(manager.clone());

    let response = worker.dispatch(&journeys_request(false, "B"));
    assert_eq!(response.response_type, ResponseType::ItineraryFound);

    // Swap in a snapshot without any trips; later dispatches see it.
    let mut empty = NetworkBuilder::new("20150314");
    empty.stop_area("A", "A", Coord::default(), Properties::default(), &[]);
    empty.stop_area("B", "B", Coord::default(), Properties::default(), &[]);
    manager.set_data(empty.build());
    let response = worker.dispatch(&journeys_request(false, "B"));
    assert_eq!(response.response_type, ResponseType::NoSolution);
}
