//! Shared fixtures for unit, behaviour and downstream crate tests.

use geo::Coord;

use crate::store::{EntityWriter, MemoryGeoStore, RouteWriter};
use crate::{AmenityDraft, Area, Boundary, Category, Polyline};

/// Corners of the city-centre test area.
pub const CITY_CENTRE: [(f64, f64); 4] = [(-6.28, 53.33), (-6.20, 53.33), (-6.20, 53.37), (-6.28, 53.37)];

/// Amenities seeded by [`dublin_store`]: name, category, longitude, latitude.
pub const DUBLIN_AMENITIES: [(&str, Category, f64, f64); 3] = [
    ("Brew Lab", Category::Cafe, -6.26, 53.35),
    ("Lift Hub", Category::Gym, -6.25, 53.34),
    ("Far Cafe", Category::Cafe, -6.24, 53.38),
];

/// Closed ring through `corners`.
///
/// # Panics
/// Panics when the corners do not form a valid ring.
#[must_use]
pub fn ring(corners: &[(f64, f64)]) -> Boundary {
    Boundary::closing(corners.iter().map(|&(x, y)| Coord { x, y }).collect())
        .expect("test ring should be valid")
}

/// Polyline through `points`.
///
/// # Panics
/// Panics when fewer than two valid points are supplied.
#[must_use]
pub fn path(points: &[(f64, f64)]) -> Polyline {
    Polyline::new(points.iter().map(|&(x, y)| Coord { x, y }).collect())
        .expect("test path should be valid")
}

/// A store holding the city-centre area, three amenities (one outside the
/// area) and the "River Walk" route crossing it.
///
/// # Panics
/// Panics if seeding the in-memory store fails.
#[must_use]
pub fn dublin_store() -> (MemoryGeoStore, Area) {
    let mut store = MemoryGeoStore::default();
    let area = store
        .insert_area("City Centre", ring(&CITY_CENTRE))
        .expect("seed area");
    for (name, category, lon, lat) in DUBLIN_AMENITIES {
        let draft = AmenityDraft::new(name, category, lon, lat).expect("seed draft");
        store.insert_amenity(draft).expect("seed amenity");
    }
    store
        .upsert_route("River Walk", path(&[(-6.27, 53.35), (-6.21, 53.35)]))
        .expect("seed route");
    (store, area)
}
