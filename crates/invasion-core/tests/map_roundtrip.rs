use std::io::Write;

use invasion_core::{City, CityMap, MapError, Side};
use proptest::prelude::*;

/// Symmetric-by-construction maps: sorted city names chained east<->west
/// with a per-link coin flip.
fn arb_chain_map() -> impl Strategy<Value = CityMap> {
    (
        prop::collection::btree_set("[A-Za-z]{1,10}", 2..10),
        prop::collection::vec(any::<bool>(), 9),
    )
        .prop_map(|(names, links)| {
            let names: Vec<String> = names.into_iter().collect();
            let mut cities: Vec<City> = names.iter().map(|name| City::new(name.clone())).collect();
            for i in 0..names.len() - 1 {
                if links[i] {
                    cities[i].set_road(Side::East, names[i + 1].clone());
                    cities[i + 1].set_road(Side::West, names[i].clone());
                }
            }
            let mut map = CityMap::new();
            for city in cities {
                map.insert(city);
            }
            map
        })
}

proptest! {
    #[test]
    fn parse_render_round_trips(map in arb_chain_map()) {
        prop_assert!(map.validate().is_ok());
        let rendered = map.render();
        let reparsed = CityMap::parse(&rendered).expect("reparse");
        prop_assert_eq!(reparsed, map);
    }
}

#[test]
fn loads_map_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "Foo north=Bar west=Baz").expect("write");
    writeln!(file, "Bar south=Foo").expect("write");
    writeln!(file, "Baz east=Foo").expect("write");
    file.flush().expect("flush");

    let map = CityMap::load(file.path()).expect("load");
    assert_eq!(map.len(), 3);
    assert!(map.validate().is_ok());
    assert_eq!(map.get("Foo").expect("Foo").road(Side::North), Some("Bar"));
}

#[test]
fn load_reports_missing_file() {
    let err = CityMap::load("/definitely/not/a/map.aimap").expect_err("missing");
    assert!(matches!(err, MapError::Io(_)));
}
