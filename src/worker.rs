use std::sync::{Arc, RwLock};

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{AccessibilityParams, Data, PlaceType};
use crate::routing::{
    self, GraphicalIsochrone, IsochroneQuery, Journey, JourneyQuery, SectionKind,
};
use crate::search::{self, Pagination, Place};
use crate::shared::datetime::DateTime;

/// Owner of the engine's current snapshot.
///
/// Reloads swap the `Arc` atomically; a request that already took its
/// snapshot keeps reading the pre-swap data until it completes.
pub struct DataManager {
    current: RwLock<Arc<Data>>,
}

impl DataManager {
    pub fn new(data: Data) -> Self {
        Self {
            current: RwLock::new(Arc::new(data)),
        }
    }

    pub fn set_data(&self, data: Data) {
        let data = Arc::new(data);
        match self.current.write() {
            Ok(mut guard) => *guard = data,
            Err(poisoned) => *poisoned.into_inner() = data,
        }
    }

    pub fn snapshot(&self) -> Arc<Data> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    Planner,
    GraphicalIsochrone,
    Places,
}

/// Schedule variant a request runs against. Carried through untouched; the
/// engine serves the base schedule only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RealtimeLevel {
    #[default]
    BaseSchedule,
    AdaptedSchedule,
    Realtime,
}

#[derive(Debug, Clone)]
pub struct LocationContext {
    pub place: String,
    /// Seconds to reach the place from the true origin/destination.
    pub access_duration: u32,
}

#[derive(Debug, Clone)]
pub struct StreetNetworkParams {
    pub origin_mode: String,
    pub destination_mode: String,
    pub walking_speed: f64,
    pub bike_speed: f64,
    pub car_speed: f64,
    pub bss_speed: f64,
}

impl Default for StreetNetworkParams {
    fn default() -> Self {
        Self {
            origin_mode: "walking".to_owned(),
            destination_mode: "walking".to_owned(),
            walking_speed: 1.0,
            bike_speed: 1.0,
            car_speed: 1.0,
            bss_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JourneysRequest {
    pub clockwise: bool,
    pub wheelchair: bool,
    pub realtime_level: RealtimeLevel,
    pub max_duration: u32,
    pub max_transfers: u32,
    pub datetimes: Vec<NaiveDateTime>,
    pub streetnetwork_params: StreetNetworkParams,
    pub origin: Vec<LocationContext>,
    pub destination: Vec<LocationContext>,
}

#[derive(Debug, Clone)]
pub struct IsochroneRequest {
    pub min_duration: u32,
    pub journeys_request: JourneysRequest,
}

#[derive(Debug, Clone)]
pub struct PlacesRequest {
    pub q: String,
    pub filter_types: Vec<PlaceType>,
    pub depth: u32,
    pub nbmax: usize,
    pub admin_uris: Vec<String>,
    pub search_type: i32,
}

/// An incoming request: an api tag plus the matching payload.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub requested_api: Option<Api>,
    pub journeys: Option<JourneysRequest>,
    pub isochrone: Option<IsochroneRequest>,
    pub places: Option<PlacesRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    ItineraryFound,
    NoSolution,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SectionViewKind {
    PublicTransport,
    Transfer,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub kind: SectionViewKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_journey: Option<String>,
    pub from: String,
    pub to: String,
    pub departure_date_time: NaiveDateTime,
    pub arrival_date_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyView {
    pub departure_date_time: NaiveDateTime,
    pub arrival_date_time: NaiveDateTime,
    pub nb_transfers: u32,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub response_type: ResponseType,
    pub journeys: Vec<JourneyView>,
    pub graphical_isochrones: Vec<GraphicalIsochrone>,
    pub places: Vec<Place>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl Response {
    fn no_solution() -> Self {
        Self {
            response_type: ResponseType::NoSolution,
            journeys: Vec::new(),
            graphical_isochrones: Vec::new(),
            places: Vec::new(),
            pagination: None,
        }
    }
}

/// Stateless dispatcher from opaque requests to the engine's handlers. One
/// snapshot is taken per dispatch and used throughout.
pub struct Worker {
    manager: Arc<DataManager>,
}

impl Worker {
    pub fn new(manager: Arc<DataManager>) -> Self {
        Self { manager }
    }

    pub fn dispatch(&self, request: &Request) -> Response {
        let data = self.manager.snapshot();
        match request.requested_api {
            Some(Api::Planner) => match &request.journeys {
                Some(journeys) => handle_journeys(&data, journeys),
                None => {
                    warn!("planner request without journeys payload");
                    Response::no_solution()
                }
            },
            Some(Api::GraphicalIsochrone) => match &request.isochrone {
                Some(isochrone) => handle_isochrone(&data, isochrone),
                None => {
                    warn!("isochrone request without payload");
                    Response::no_solution()
                }
            },
            Some(Api::Places) => match &request.places {
                Some(places) => handle_places(&data, places),
                None => {
                    warn!("places request without payload");
                    Response::no_solution()
                }
            },
            None => {
                warn!("request without an api tag");
                Response::no_solution()
            }
        }
    }
}

fn handle_journeys(data: &Data, request: &JourneysRequest) -> Response {
    let Some(query) = journey_query(data, request) else {
        return Response::no_solution();
    };
    match routing::journeys(data, &query) {
        Ok(journeys) if !journeys.is_empty() => Response {
            response_type: ResponseType::ItineraryFound,
            journeys: journeys.iter().map(|j| journey_view(data, j)).collect(),
            graphical_isochrones: Vec::new(),
            places: Vec::new(),
            pagination: None,
        },
        Ok(_) => Response::no_solution(),
        Err(err) => {
            debug!("planner rejected request: {err}");
            Response::no_solution()
        }
    }
}

fn handle_isochrone(data: &Data, request: &IsochroneRequest) -> Response {
    let journeys_request = &request.journeys_request;
    let Some(query) = journey_query(data, journeys_request) else {
        return Response::no_solution();
    };
    let query = IsochroneQuery {
        origins: query.origins,
        datetime: query.datetime,
        access: query.access,
        max_duration: query.max_duration,
        min_duration: request.min_duration,
        max_transfers: query.max_transfers,
        walking_speed: journeys_request.streetnetwork_params.walking_speed,
    };
    match routing::isochrone(data, &query) {
        Ok(isochrones) if !isochrones.is_empty() => Response {
            response_type: ResponseType::ItineraryFound,
            journeys: Vec::new(),
            graphical_isochrones: isochrones,
            places: Vec::new(),
            pagination: None,
        },
        Ok(_) => Response::no_solution(),
        Err(err) => {
            debug!("isochrone rejected request: {err}");
            Response::no_solution()
        }
    }
}

fn handle_places(data: &Data, request: &PlacesRequest) -> Response {
    let result = search::autocomplete(
        data,
        &request.q,
        &request.filter_types,
        request.depth,
        request.nbmax,
        &request.admin_uris,
        request.search_type,
    );
    Response {
        response_type: if result.places.is_empty() {
            ResponseType::NoSolution
        } else {
            ResponseType::ItineraryFound
        },
        journeys: Vec::new(),
        graphical_isochrones: Vec::new(),
        places: result.places,
        pagination: Some(result.pagination),
    }
}

fn journey_query(data: &Data, request: &JourneysRequest) -> Option<JourneyQuery> {
    let naive = request.datetimes.first()?;
    let datetime = to_engine_datetime(data, *naive)?;
    let access = if request.wheelchair {
        AccessibilityParams::wheelchair()
    } else {
        AccessibilityParams::default()
    };
    Some(JourneyQuery {
        origins: request
            .origin
            .iter()
            .map(|l| (l.place.clone(), l.access_duration))
            .collect(),
        destinations: request
            .destination
            .iter()
            .map(|l| (l.place.clone(), l.access_duration))
            .collect(),
        datetime,
        clockwise: request.clockwise,
        access,
        max_duration: request.max_duration,
        max_transfers: request.max_transfers,
    })
}

/// Day offset + seconds-within-day against the snapshot's reference date.
/// Requests before the reference date have no answer.
fn to_engine_datetime(data: &Data, naive: NaiveDateTime) -> Option<DateTime> {
    let days = naive
        .date()
        .signed_duration_since(data.reference_date)
        .num_days();
    if days < 0 {
        return None;
    }
    Some(DateTime::set(
        days as u32,
        naive.time().num_seconds_from_midnight(),
    ))
}

fn to_naive_datetime(data: &Data, dt: DateTime) -> NaiveDateTime {
    let date = data.reference_date + chrono::Days::new(dt.date() as u64);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(dt.hour(), 0).unwrap_or(NaiveTime::MIN);
    date.and_time(time)
}

fn journey_view(data: &Data, journey: &Journey) -> JourneyView {
    JourneyView {
        departure_date_time: to_naive_datetime(data, journey.departure),
        arrival_date_time: to_naive_datetime(data, journey.arrival),
        nb_transfers: journey.nb_transfers,
        sections: journey
            .sections
            .iter()
            .map(|section| SectionView {
                kind: match section.kind {
                    SectionKind::PublicTransport => SectionViewKind::PublicTransport,
                    SectionKind::Transfer => SectionViewKind::Transfer,
                },
                vehicle_journey: section
                    .vehicle_journey_idx
                    .map(|vj| data.vehicle_journeys[vj as usize].uri.to_string()),
                from: data.stop_points[section.from_stop_point_idx as usize]
                    .uri
                    .to_string(),
                to: data.stop_points[section.to_stop_point_idx as usize]
                    .uri
                    .to_string(),
                departure_date_time: to_naive_datetime(data, section.departure),
                arrival_date_time: to_naive_datetime(data, section.arrival),
            })
            .collect(),
    }
}
