use rayon::prelude::*;
use serde::Serialize;

use crate::model::{Data, PlaceType};
use crate::search::index::{FlQuality, SearchIndex, tokenize};
use crate::shared::geo::Coord;

/// A ranked, typed autocomplete result.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Place {
    pub embedded_type: PlaceType,
    pub uri: String,
    pub name: String,
    pub quality: i32,
    pub coord: Coord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub administrative_regions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub total_result: i32,
    pub start_page: i32,
    pub items_per_page: i32,
    pub items_on_page: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacesResult {
    pub places: Vec<Place>,
    pub pagination: Pagination,
}

/// Free-text place lookup over every requested entity type.
///
/// Each type is queried for up to `max(100, nbmax)` candidates so that
/// quality shaping can reorder before the cut, then the merged list goes
/// through two sorts: a pure quality cutoff at `nbmax`, and a display
/// reorder grouping the kept items by type. Items below the cutoff never
/// influence the grouping.
pub fn autocomplete(
    data: &Data,
    q: &str,
    filter_types: &[PlaceType],
    depth: u32,
    nbmax: usize,
    admin_uris: &[String],
    search_type: i32,
) -> PlacesResult {
    let widened = nbmax.max(100);
    let is_address_type =
        data.stop_area_index
            .is_address_type(q, &data.alias, &data.synonyms);
    let required_admins = data.admin_idxs_for_uris(admin_uris.iter().map(String::as_str));

    // One indexed parallel task per requested type; collecting the per-type
    // vectors first keeps the merge order identical to the filter order.
    let per_type: Vec<Vec<Place>> = filter_types
        .par_iter()
        .map(|place_type| {
            let mut result = search_one_type(
                data,
                *place_type,
                q,
                widened,
                &required_admins,
                search_type,
            );
            shape_quality(data, *place_type, is_address_type, &mut result);
            result
                .iter()
                .map(|fl| build_place(data, *place_type, fl, depth))
                .collect()
        })
        .collect();
    let mut places: Vec<Place> = per_type.into_iter().flatten().collect();

    // Pass 1: quality cutoff. Ties are broken on name then uri so identical
    // inputs always produce identical output.
    places.sort_by(|a, b| {
        b.quality
            .cmp(&a.quality)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.uri.cmp(&b.uri))
    });
    places.truncate(nbmax);

    // Pass 2: group the kept items by display rank.
    places.sort_by(|a, b| {
        a.embedded_type
            .embedded_type_order()
            .cmp(&b.embedded_type.embedded_type_order())
            .then_with(|| b.quality.cmp(&a.quality))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.uri.cmp(&b.uri))
    });

    let count = places.len() as i32;
    PlacesResult {
        places,
        pagination: Pagination {
            total_result: count,
            start_page: 0,
            items_per_page: nbmax as i32,
            items_on_page: count,
        },
    }
}

fn search_one_type(
    data: &Data,
    place_type: PlaceType,
    q: &str,
    nbmax: usize,
    required_admins: &[u32],
    search_type: i32,
) -> Vec<FlQuality> {
    let filter = |idx: u32| valid_admin(data, place_type, required_admins, idx);
    let run = |index: &SearchIndex| {
        if search_type == 0 {
            index.find_complete(q, &data.alias, &data.synonyms, data.word_weight, nbmax, filter)
        } else {
            index.find_partial_with_pattern(
                q,
                &data.alias,
                &data.synonyms,
                data.word_weight,
                nbmax,
                filter,
            )
        }
    };
    match place_type {
        PlaceType::StopArea => run(&data.stop_area_index),
        PlaceType::StopPoint => run(&data.stop_point_index),
        PlaceType::Admin => run(&data.admin_index),
        PlaceType::Poi => run(&data.poi_index),
        PlaceType::Address => find_ways(data, q, nbmax, search_type, filter),
        // Partial matching is not wired for lines; both search modes resolve
        // complete, without any admin restriction.
        PlaceType::Line => data.line_index.find_complete(
            q,
            &data.alias,
            &data.synonyms,
            data.word_weight,
            nbmax,
            |_| true,
        ),
    }
}

/// Address search: peels the first numeric token off the query as a house
/// number, matches the rest against way names and resolves the number to an
/// interpolated position along the way.
pub fn find_ways(
    data: &Data,
    q: &str,
    nbmax: usize,
    search_type: i32,
    filter: impl Fn(u32) -> bool,
) -> Vec<FlQuality> {
    let tokens = tokenize(q);
    let number = tokens
        .iter()
        .find(|t| t.chars().all(|c| c.is_ascii_digit()))
        .and_then(|t| t.parse::<u32>().ok());
    let street_query = tokens
        .iter()
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");

    let mut result = if search_type == 0 {
        data.way_index.find_complete(
            &street_query,
            &data.alias,
            &data.synonyms,
            data.word_weight,
            nbmax,
            filter,
        )
    } else {
        data.way_index.find_partial_with_pattern(
            &street_query,
            &data.alias,
            &data.synonyms,
            data.word_weight,
            nbmax,
            filter,
        )
    };

    if let Some(number) = number {
        for fl in &mut result {
            let way = &data.ways[fl.idx as usize];
            fl.house_number = Some(number);
            fl.coord = Some(way.house_number_coord(number));
        }
    }
    result
}

/// Quality penalty encoding the display preference between entity kinds,
/// flipped when the query looks like an address.
pub fn penalty_by_type(place_type: PlaceType, is_address_type: bool) -> i32 {
    match place_type {
        PlaceType::Admin => {
            if is_address_type {
                8
            } else {
                0
            }
        }
        PlaceType::StopArea => 2,
        PlaceType::Poi => {
            if is_address_type {
                4
            } else {
                6
            }
        }
        PlaceType::Address => {
            if is_address_type {
                0
            } else {
                8
            }
        }
        PlaceType::StopPoint => {
            if is_address_type {
                6
            } else {
                4
            }
        }
        PlaceType::Line => 0,
    }
}

fn shape_quality(
    data: &Data,
    place_type: PlaceType,
    is_address_type: bool,
    result: &mut [FlQuality],
) {
    let penalty = penalty_by_type(place_type, is_address_type);
    for item in result.iter_mut() {
        item.quality -= penalty;
    }

    #[cfg(feature = "poi-weight")]
    if place_type == PlaceType::Poi {
        for item in result.iter_mut() {
            let weighted = item.quality + data.pois[item.idx as usize].weight * 2;
            item.quality = weighted.min(100);
        }
    }

    // Entities with no admin cannot be geographically disambiguated; lines
    // and admins themselves are exempt.
    if !matches!(place_type, PlaceType::Line | PlaceType::Admin) {
        for item in result.iter_mut() {
            if admin_list(data, place_type, item.idx).is_empty() {
                item.quality -= data.word_weight * 2;
            }
        }
    }
}

fn valid_admin(data: &Data, place_type: PlaceType, required: &[u32], idx: u32) -> bool {
    if required.is_empty() {
        return true;
    }
    admin_list(data, place_type, idx)
        .iter()
        .any(|a| required.contains(a))
}

fn admin_list(data: &Data, place_type: PlaceType, idx: u32) -> &[u32] {
    match place_type {
        PlaceType::StopArea => &data.stop_areas[idx as usize].admin_list,
        PlaceType::StopPoint => &data.stop_points[idx as usize].admin_list,
        PlaceType::Admin => &data.admins[idx as usize].admin_list,
        PlaceType::Poi => &data.pois[idx as usize].admin_list,
        PlaceType::Address => &data.ways[idx as usize].admin_list,
        PlaceType::Line => &data.lines[idx as usize].admin_list,
    }
}

fn build_place(data: &Data, place_type: PlaceType, fl: &FlQuality, depth: u32) -> Place {
    let (uri, name, coord) = match place_type {
        PlaceType::StopArea => {
            let e = &data.stop_areas[fl.idx as usize];
            (e.uri.to_string(), e.name.to_string(), e.coord)
        }
        PlaceType::StopPoint => {
            let e = &data.stop_points[fl.idx as usize];
            (e.uri.to_string(), e.name.to_string(), e.coord)
        }
        PlaceType::Admin => {
            let e = &data.admins[fl.idx as usize];
            (e.uri.to_string(), e.name.to_string(), e.coord)
        }
        PlaceType::Poi => {
            let e = &data.pois[fl.idx as usize];
            (e.uri.to_string(), e.name.to_string(), e.coord)
        }
        PlaceType::Address => {
            let way = &data.ways[fl.idx as usize];
            let uri = match fl.house_number {
                Some(n) => format!("{}:{}", way.uri, n),
                None => way.uri.to_string(),
            };
            (uri, way.name.to_string(), fl.coord.unwrap_or(way.coord))
        }
        PlaceType::Line => {
            let e = &data.lines[fl.idx as usize];
            (e.uri.to_string(), e.name.to_string(), e.coord)
        }
    };

    let administrative_regions = if depth > 0 {
        admin_list(data, place_type, fl.idx)
            .iter()
            .map(|a| data.admins[*a as usize].name.to_string())
            .collect()
    } else {
        Vec::new()
    };

    Place {
        embedded_type: place_type,
        uri,
        name,
        quality: fl.quality,
        coord,
        house_number: fl.house_number,
        administrative_regions,
    }
}
