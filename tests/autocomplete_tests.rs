use ravel::model::builder::NetworkBuilder;
use ravel::model::{Data, PlaceType, Properties};
use ravel::search::autocomplete;
use ravel::shared::geo::Coord;

const ALL_TYPES: &[PlaceType] = &[
    PlaceType::Admin,
    PlaceType::StopArea,
    PlaceType::StopPoint,
    PlaceType::Address,
    PlaceType::Poi,
    PlaceType::Line,
];

fn corpus() -> Data {
    let mut b = NetworkBuilder::new("20150314");
    b.word_weight(5);
    b.alias("bd", "boulevard");
    b.synonym("st", &["saint"]);

    let paris = b.admin("admin:paris", "paris", Coord::new(2.3522, 48.8566));
    b.stop_area(
        "sa:lyon",
        "gare de lyon",
        Coord::new(2.3730, 48.8443),
        Properties::default(),
        &[paris],
    );
    b.stop_area(
        "sa:nord",
        "gare du nord",
        Coord::new(2.3553, 48.8809),
        Properties::default(),
        &[paris],
    );
    // No admin: geographic disambiguation is impossible for this one.
    b.stop_area(
        "sa:orphan",
        "gare perdue",
        Coord::new(0.0, 0.0),
        Properties::default(),
        &[],
    );
    b.way(
        "way:paix",
        "rue de la paix",
        &[paris],
        &[
            (1, Coord::new(2.3310, 48.8690)),
            (20, Coord::new(2.3330, 48.8710)),
        ],
    );
    b.poi(
        "poi:opera",
        "opera garnier",
        Coord::new(2.3316, 48.8719),
        3,
        &[paris],
    );
    b.line("line:pb", "paris banlieue");
    b.build()
}

#[test]
fn result_length_is_bounded_by_nbmax() {
    let data = corpus();
    let result = autocomplete(&data, "gare", ALL_TYPES, 0, 2, &[], 0);
    assert!(result.places.len() <= 2);
    assert_eq!(result.pagination.items_per_page, 2);
}

#[test]
fn results_are_grouped_by_type_then_quality_then_name() {
    let data = corpus();
    let result = autocomplete(&data, "paris", ALL_TYPES, 0, 10, &[], 0);
    assert!(!result.places.is_empty());
    let keys: Vec<_> = result
        .places
        .iter()
        .map(|p| {
            (
                p.embedded_type.embedded_type_order(),
                -p.quality,
                p.name.clone(),
            )
        })
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
    // The admin wins the display order over the line.
    assert_eq!(result.places[0].uri, "admin:paris");
}

#[test]
fn admin_filter_restricts_all_but_lines() {
    let data = corpus();
    let admin_uris = vec!["admin:paris".to_owned()];
    let result = autocomplete(&data, "gare", ALL_TYPES, 0, 10, &admin_uris, 0);
    assert!(result.places.iter().all(|p| p.uri != "sa:orphan"));
    assert!(result.places.iter().any(|p| p.uri == "sa:lyon"));

    // Lines are unfiltered by design.
    let result = autocomplete(
        &data,
        "paris banlieue",
        &[PlaceType::Line],
        0,
        10,
        &admin_uris,
        0,
    );
    assert_eq!(result.places.len(), 1);
    assert_eq!(result.places[0].uri, "line:pb");
}

#[test]
fn unknown_admin_uri_is_ignored() {
    let data = corpus();
    let admin_uris = vec!["admin:nowhere".to_owned()];
    let result = autocomplete(&data, "gare", &[PlaceType::StopArea], 0, 10, &admin_uris, 0);
    // The filter resolves to nothing, which means no restriction at all.
    assert_eq!(result.places.len(), 3);
}

#[test]
fn identical_inputs_produce_identical_outputs() {
    let data = corpus();
    let run = || autocomplete(&data, "gare", ALL_TYPES, 1, 10, &[], 0);
    let first = run();
    let second = run();
    assert_eq!(first.places, second.places);
    assert_eq!(first.pagination, second.pagination);
}

#[test]
fn missing_admin_is_penalized() {
    let data = corpus();
    let result = autocomplete(&data, "gare", &[PlaceType::StopArea], 0, 10, &[], 0);
    let lyon = result.places.iter().find(|p| p.uri == "sa:lyon").unwrap();
    let orphan = result.places.iter().find(|p| p.uri == "sa:orphan").unwrap();
    // "gare perdue" matches more tightly but pays 2x word_weight for having
    // no admin.
    assert!(lyon.quality > orphan.quality);
}

#[test]
fn address_query_resolves_house_number() {
    let data = corpus();
    let result = autocomplete(
        &data,
        "10 rue de la paix",
        &[PlaceType::Address, PlaceType::StopPoint],
        0,
        10,
        &[],
        0,
    );
    let top = &result.places[0];
    assert_eq!(top.embedded_type, PlaceType::Address);
    assert_eq!(top.uri, "way:paix:10");
    assert_eq!(top.house_number, Some(10));
    // 10 interpolates between number 1 and number 20.
    let way = &data.ways[0];
    let coord = top.coord;
    assert!(coord.lon > way.house_numbers[0].coord.lon);
    assert!(coord.lon < way.house_numbers[1].coord.lon);
}

#[test]
fn address_intent_flips_type_penalties() {
    let data = corpus();
    // "10 ..." looks like an address, so an address beats a stop area of the
    // same raw quality; without the number the stop area wins.
    let addressish = autocomplete(
        &data,
        "10 rue de la paix",
        &[PlaceType::Address],
        0,
        10,
        &[],
        0,
    );
    let plain = autocomplete(&data, "rue de la paix", &[PlaceType::Address], 0, 10, &[], 0);
    assert_eq!(addressish.places[0].quality, plain.places[0].quality + 8);
}

#[test]
fn partial_search_completes_the_last_token() {
    let data = corpus();
    let result = autocomplete(&data, "gare de ly", &[PlaceType::StopArea], 0, 10, &[], 1);
    assert_eq!(result.places.len(), 1);
    assert_eq!(result.places[0].uri, "sa:lyon");
    // Complete mode refuses the dangling prefix.
    let result = autocomplete(&data, "gare de ly", &[PlaceType::StopArea], 0, 10, &[], 0);
    assert!(result.places.is_empty());
}

#[test]
fn alias_and_synonyms_apply_to_queries() {
    let mut b = NetworkBuilder::new("20150314");
    b.alias("bd", "boulevard");
    b.synonym("st", &["saint"]);
    b.way(
        "way:bsm",
        "boulevard saint michel",
        &[],
        &[(1, Coord::new(2.34, 48.85))],
    );
    let data = b.build();
    let result = autocomplete(&data, "bd st michel", &[PlaceType::Address], 0, 10, &[], 0);
    assert_eq!(result.places.len(), 1);
    assert_eq!(result.places[0].name, "boulevard saint michel");
}

#[test]
fn no_match_still_yields_a_well_formed_response() {
    let data = corpus();
    let result = autocomplete(&data, "zzz introuvable", ALL_TYPES, 0, 10, &[], 0);
    assert!(result.places.is_empty());
    assert_eq!(result.pagination.total_result, 0);
    assert_eq!(result.pagination.items_on_page, 0);
    assert_eq!(result.pagination.start_page, 0);
}

#[test]
fn depth_populates_administrative_regions() {
    let data = corpus();
    let shallow = autocomplete(&data, "gare de lyon", &[PlaceType::StopArea], 0, 10, &[], 0);
    assert!(shallow.places[0].administrative_regions.is_empty());
    let deep = autocomplete(&data, "gare de lyon", &[PlaceType::StopArea], 1, 10, &[], 0);
    assert_eq!(deep.places[0].administrative_regions, vec!["paris".to_owned()]);
}
