//! Property tests for the query engine against brute-force predicates.

use std::sync::Arc;

use geo::Coord;
use lbs_core::{
    AmenityDraft, Area, Boundary, Catalog, Category, EntityWriter, MemoryGeoStore, QueryEngine,
    QueryParams, RouteWriter,
    geometry::{distance, point_in_polygon, polyline_intersects_polygon},
    query::{AreaRequest, MAX_LIMIT, NearestRequest, RadiusRequest},
    test_support::path,
};
use proptest::prelude::*;

const LON: std::ops::Range<f64> = -6.40..-6.10;
const LAT: std::ops::Range<f64> = 53.25..53.45;

fn position() -> impl Strategy<Value = (f64, f64)> {
    (LON, LAT)
}

// Axis-aligned rectangle plus an optional notch vertex making it concave.
fn area_ring() -> impl Strategy<Value = Vec<(f64, f64)>> {
    (position(), 0.01..0.15_f64, 0.01..0.15_f64, any::<bool>()).prop_map(
        |((x, y), w, h, notch)| {
            let mut ring = vec![(x, y), (x + w, y), (x + w, y + h)];
            if notch {
                ring.push((x + w / 2.0, y + h / 2.0));
            }
            ring.push((x, y + h));
            ring
        },
    )
}

struct World {
    engine: QueryEngine,
    store: MemoryGeoStore,
    area: Area,
}

fn build(
    amenities: &[(f64, f64)],
    routes: &[Vec<(f64, f64)>],
    ring: &[(f64, f64)],
) -> World {
    let mut store = MemoryGeoStore::default();
    let boundary = Boundary::closing(ring.iter().map(|&(x, y)| Coord { x, y }).collect())
        .expect("generated ring is valid");
    let area = store.insert_area("Generated", boundary).expect("insert area");
    for (n, &(lon, lat)) in amenities.iter().enumerate() {
        let draft = AmenityDraft::new(&format!("Amenity {n}"), Category::Shop, lon, lat)
            .expect("generated amenity is valid");
        store.insert_amenity(draft).expect("insert amenity");
    }
    for (n, points) in routes.iter().enumerate() {
        store
            .upsert_route(&format!("Route {n}"), path(points))
            .expect("insert route");
    }
    let catalog = Catalog::load(&store).expect("load catalog");
    World {
        engine: QueryEngine::new(Arc::new(catalog)),
        store,
        area,
    }
}

fn ids_inside(world: &World) -> Vec<u64> {
    use lbs_core::GeoStore;
    world
        .store
        .list_amenities()
        .expect("list amenities")
        .into_iter()
        .filter(|a| point_in_polygon(a.location, &world.area.boundary))
        .map(|a| a.id.get())
        .collect()
}

proptest! {
    #[test]
    fn nearest_is_sorted_and_bounded(
        amenities in prop::collection::vec(position(), 0..160),
        origin in position(),
        limit in 1_usize..150,
    ) {
        let world = build(&amenities, &[], &[(-6.3, 53.3), (-6.2, 53.3), (-6.2, 53.4)]);
        let request = NearestRequest::new(Coord { x: origin.0, y: origin.1 }, limit, None)
            .expect("valid request");
        let hits = world.engine.nearest_amenities(&request).expect("query");

        prop_assert!(hits.len() <= limit.min(MAX_LIMIT));
        prop_assert_eq!(hits.len(), amenities.len().min(limit).min(MAX_LIMIT));
        prop_assert!(hits.windows(2).all(|w| w[0].distance_m <= w[1].distance_m));
    }

    #[test]
    fn nearest_matches_brute_force(
        amenities in prop::collection::vec(position(), 1..60),
        origin in position(),
        limit in 1_usize..20,
    ) {
        use lbs_core::GeoStore;
        let world = build(&amenities, &[], &[(-6.3, 53.3), (-6.2, 53.3), (-6.2, 53.4)]);
        let origin = Coord { x: origin.0, y: origin.1 };
        let hits = world
            .engine
            .nearest_amenities(&NearestRequest::new(origin, limit, None).expect("valid request"))
            .expect("query");

        let mut expected: Vec<(f64, u64)> = world
            .store
            .list_amenities()
            .expect("list")
            .into_iter()
            .map(|a| (distance(origin, a.location), a.id.get()))
            .collect();
        expected.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        expected.truncate(limit);

        let actual: Vec<u64> = hits.iter().map(|hit| hit.amenity.id.get()).collect();
        let expected: Vec<u64> = expected.into_iter().map(|(_, id)| id).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn limits_above_the_cap_are_clamped(
        amenities in prop::collection::vec(position(), 101..160),
        raw in 101_usize..1_000_000,
    ) {
        let world = build(&amenities, &[], &[(-6.3, 53.3), (-6.2, 53.3), (-6.2, 53.4)]);
        let params = QueryParams::from_pairs([
            ("lat", "53.35".to_owned()),
            ("lng", "-6.26".to_owned()),
            ("limit", raw.to_string()),
        ]);
        let parsed = NearestRequest::from_params(&params).expect("valid request");
        prop_assert_eq!(parsed.limit(), MAX_LIMIT);
        let typed = NearestRequest::new(Coord { x: -6.26, y: 53.35 }, raw, None)
            .expect("valid request");

        for request in [parsed, typed] {
            let hits = world.engine.nearest_amenities(&request).expect("query");
            prop_assert_eq!(hits.len(), MAX_LIMIT);
        }
    }

    #[test]
    fn non_positive_limits_are_rejected(raw in -1_000_i64..=0) {
        let params = QueryParams::from_pairs([
            ("lat", "53.35".to_owned()),
            ("lng", "-6.26".to_owned()),
            ("limit", raw.to_string()),
        ]);
        let err = NearestRequest::from_params(&params).expect_err("limit rejected");
        prop_assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn non_positive_km_is_rejected(km in -100.0_f64..=0.0) {
        let params = QueryParams::from_pairs([
            ("lat", "53.35".to_owned()),
            ("lng", "-6.26".to_owned()),
            ("km", km.to_string()),
        ]);
        prop_assert!(RadiusRequest::from_params(&params).is_err());
    }

    #[test]
    fn within_area_equals_point_in_polygon(
        amenities in prop::collection::vec(position(), 0..60),
        ring in area_ring(),
    ) {
        let world = build(&amenities, &[], &ring);
        let found: Vec<u64> = world
            .engine
            .amenities_within_area(&AreaRequest { area: world.area.id })
            .expect("query")
            .into_iter()
            .map(|a| a.id.get())
            .collect();
        prop_assert_eq!(found, ids_inside(&world));
    }

    #[test]
    fn nearest_in_area_is_subset_of_within_area(
        amenities in prop::collection::vec(position(), 0..60),
        ring in area_ring(),
        origin in position(),
        limit in 1_usize..30,
    ) {
        let world = build(&amenities, &[], &ring);
        let request =
            NearestRequest::new(Coord { x: origin.0, y: origin.1 }, limit, Some(world.area.id))
                .expect("valid request");
        let nearest = world.engine.nearest_amenities(&request).expect("query");
        let inside = ids_inside(&world);
        prop_assert!(nearest.iter().all(|hit| inside.contains(&hit.amenity.id.get())));
        prop_assert_eq!(nearest.len(), inside.len().min(limit));
    }

    #[test]
    fn routes_equal_brute_force(
        routes in prop::collection::vec(prop::collection::vec(position(), 2..6), 0..25),
        ring in area_ring(),
    ) {
        use lbs_core::GeoStore;
        let world = build(&[], &routes, &ring);
        let found: Vec<u64> = world
            .engine
            .routes_intersecting_area(&AreaRequest { area: world.area.id })
            .expect("query")
            .into_iter()
            .map(|r| r.id.get())
            .collect();
        let expected: Vec<u64> = world
            .store
            .list_routes()
            .expect("list")
            .into_iter()
            .filter(|r| polyline_intersects_polygon(&r.path, &world.area.boundary))
            .map(|r| r.id.get())
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn radius_equals_brute_force(
        amenities in prop::collection::vec(position(), 0..60),
        origin in position(),
        km in 0.1_f64..15.0,
    ) {
        use lbs_core::GeoStore;
        let world = build(&amenities, &[], &[(-6.3, 53.3), (-6.2, 53.3), (-6.2, 53.4)]);
        let origin = Coord { x: origin.0, y: origin.1 };
        let request = RadiusRequest::new(origin, km, None).expect("valid radius");
        let found: Vec<u64> = world
            .engine
            .amenities_within_radius(&request)
            .expect("query")
            .into_iter()
            .map(|hit| hit.amenity.id.get())
            .collect();
        let expected: Vec<u64> = world
            .store
            .list_amenities()
            .expect("list")
            .into_iter()
            .filter(|a| distance(origin, a.location) <= km * 1000.0)
            .map(|a| a.id.get())
            .collect();
        prop_assert_eq!(found, expected);
    }
}
