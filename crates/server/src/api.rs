use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use ravel::model::PlaceType;
use ravel::worker::{
    Api, IsochroneRequest, JourneysRequest, LocationContext, PlacesRequest, RealtimeLevel,
    Request, StreetNetworkParams,
};
use tracing::warn;

use crate::state::AppState;

const ALL_TYPES: &[PlaceType] = &[
    PlaceType::Admin,
    PlaceType::StopArea,
    PlaceType::StopPoint,
    PlaceType::Address,
    PlaceType::Poi,
    PlaceType::Line,
];

pub async fn status() -> &'static str {
    "ok"
}

/// `GET /places?q=...&types=stop_area,admin&nbmax=10&admin_uris=...&search_type=1`
pub async fn places(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let q = params.get("q").ok_or(StatusCode::BAD_REQUEST)?.clone();
    let filter_types = match params.get("types") {
        // Unknown type names are skipped, not rejected.
        Some(types) => types.split(',').filter_map(parse_place_type).collect(),
        None => ALL_TYPES.to_vec(),
    };
    let request = Request {
        requested_api: Some(Api::Places),
        places: Some(PlacesRequest {
            q,
            filter_types,
            depth: parse_or(&params, "depth", 0),
            nbmax: parse_or(&params, "nbmax", 10),
            admin_uris: params
                .get("admin_uris")
                .map(|uris| uris.split(',').map(str::to_owned).collect())
                .unwrap_or_default(),
            search_type: parse_or(&params, "search_type", 0),
        }),
        ..Default::default()
    };
    Ok(Json(state.worker.dispatch(&request)).into_response())
}

/// `GET /journeys?from=A&to=B&datetime=20250601T080000&wheelchair=true`
pub async fn journeys(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let journeys = journeys_from_params(&params, true)?;
    let request = Request {
        requested_api: Some(Api::Planner),
        journeys: Some(journeys),
        ..Default::default()
    };
    Ok(Json(state.worker.dispatch(&request)).into_response())
}

/// `GET /isochrones?from=A&datetime=20250601T080000&max_duration=3600&min_duration=0`
pub async fn isochrones(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, StatusCode> {
    let journeys = journeys_from_params(&params, false)?;
    let request = Request {
        requested_api: Some(Api::GraphicalIsochrone),
        isochrone: Some(IsochroneRequest {
            min_duration: parse_or(&params, "min_duration", 0),
            journeys_request: journeys,
        }),
        ..Default::default()
    };
    Ok(Json(state.worker.dispatch(&request)).into_response())
}

fn journeys_from_params(
    params: &HashMap<String, String>,
    with_destination: bool,
) -> Result<JourneysRequest, StatusCode> {
    let origin = params.get("from").ok_or(StatusCode::BAD_REQUEST)?;
    let destination = if with_destination {
        Some(params.get("to").ok_or(StatusCode::BAD_REQUEST)?)
    } else {
        None
    };
    let datetime = params.get("datetime").ok_or(StatusCode::BAD_REQUEST)?;
    let datetime = NaiveDateTime::parse_from_str(datetime, "%Y%m%dT%H%M%S").map_err(|err| {
        warn!("unparseable datetime {datetime}: {err}");
        StatusCode::BAD_REQUEST
    })?;

    Ok(JourneysRequest {
        clockwise: parse_or(params, "clockwise", true),
        wheelchair: parse_or(params, "wheelchair", false),
        realtime_level: RealtimeLevel::BaseSchedule,
        max_duration: parse_or(params, "max_duration", u32::MAX),
        max_transfers: parse_or(params, "max_transfers", 10),
        datetimes: vec![datetime],
        streetnetwork_params: StreetNetworkParams::default(),
        origin: vec![LocationContext {
            place: origin.clone(),
            access_duration: 0,
        }],
        destination: destination
            .map(|place| {
                vec![LocationContext {
                    place: place.clone(),
                    access_duration: 0,
                }]
            })
            .unwrap_or_default(),
    })
}

fn parse_place_type(name: &str) -> Option<PlaceType> {
    match name.trim() {
        "admin" => Some(PlaceType::Admin),
        "stop_area" => Some(PlaceType::StopArea),
        "stop_point" => Some(PlaceType::StopPoint),
        "address" => Some(PlaceType::Address),
        "poi" => Some(PlaceType::Poi),
        "line" => Some(PlaceType::Line),
        _ => None,
    }
}

fn parse_or<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str, default: T) -> T {
    params
        .get(key)
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
