//! A small built-in network so the server answers something out of the box.
//! A real deployment swaps in a loader-produced snapshot through the
//! [`ravel::worker::DataManager`].

use ravel::model::builder::NetworkBuilder;
use ravel::model::{Data, Properties, VehicleProperties};
use ravel::shared::geo::Coord;

pub fn network() -> Data {
    let mut b = NetworkBuilder::new("20250601");
    b.alias("bd", "boulevard");
    b.synonym("st", &["saint"]);

    let centre = b.admin("admin:centre", "centre ville", Coord::new(2.3522, 48.8566));
    let accessible = Properties::WHEELCHAIR_BOARDING;
    b.stop_area(
        "sa:hotel_de_ville",
        "hotel de ville",
        Coord::new(2.3513, 48.8571),
        accessible,
        &[centre],
    );
    b.stop_area(
        "sa:bastille",
        "bastille",
        Coord::new(2.3688, 48.8531),
        accessible,
        &[centre],
    );
    b.stop_area(
        "sa:nation",
        "nation",
        Coord::new(2.3959, 48.8483),
        Properties::default(),
        &[centre],
    );
    b.way(
        "way:rivoli",
        "rue de rivoli",
        &[centre],
        &[
            (1, Coord::new(2.3610, 48.8554)),
            (99, Coord::new(2.3470, 48.8589)),
        ],
    );
    b.poi(
        "poi:place_des_vosges",
        "place des vosges",
        Coord::new(2.3655, 48.8559),
        5,
        &[centre],
    );

    let every_day = "1111111111111111111111111111";
    for (vj, first) in [("m1:1", 8), ("m1:2", 9), ("m1:3", 10)] {
        b.vj("m1", vj, every_day, VehicleProperties::WHEELCHAIR_ACCESSIBLE)
            .st("stop_point:sa:hotel_de_ville", &format!("{first}:00"))
            .st("stop_point:sa:bastille", &format!("{first}:10"))
            .st("stop_point:sa:nation", &format!("{first}:20"));
    }
    // A counter-direction shuttle every 15 minutes all morning.
    b.vj("m2", "m2:freq", every_day, VehicleProperties::default())
        .st("stop_point:sa:nation", "7:00")
        .st("stop_point:sa:hotel_de_ville", "7:25")
        .frequency("7:00", "12:00", 900);
    b.connection(
        "stop_point:sa:hotel_de_ville",
        "stop_point:sa:bastille",
        600,
    );
    b.build()
}
