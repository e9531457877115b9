//! The four read-only spatial queries.
//!
//! Every query takes one [`CatalogSnapshot`], fetches candidates from the
//! relevant index by bounding box and then applies the exact predicate from
//! [`crate::geometry`] to each candidate. The index only accelerates; it never
//! decides membership.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::catalog::{Catalog, CatalogSnapshot};
use crate::geometry::{Location, distance, radius_envelope};
use crate::{Amenity, Area, AreaId, Entity, Route};

mod params;

pub use params::{
    AreaRequest, DEFAULT_LIMIT, DEFAULT_RADIUS_KM, MAX_LIMIT, NearestRequest, QueryError,
    QueryErrorKind, QueryParams, RadiusRequest,
};

/// An amenity paired with its great-circle distance from the query origin.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyAmenity {
    /// The matching amenity.
    pub amenity: Amenity,
    /// Distance from the origin in metres.
    pub distance_m: f64,
}

/// Answers spatial queries against a shared [`Catalog`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use lbs_core::{AmenityDraft, Catalog, Category, EntityWriter, MemoryGeoStore};
/// use lbs_core::query::{NearestRequest, QueryEngine, QueryParams};
///
/// let mut store = MemoryGeoStore::default();
/// let draft = AmenityDraft::new("Brew Lab", Category::Cafe, -6.26, 53.35).expect("valid");
/// store.insert_amenity(draft).expect("insert");
///
/// let engine = QueryEngine::new(Arc::new(Catalog::load(&store).expect("load")));
/// let params = QueryParams::from_pairs([("lat", "53.35"), ("lng", "-6.26")]);
/// let request = NearestRequest::from_params(&params).expect("valid params");
/// let nearest = engine.nearest_amenities(&request).expect("query");
/// assert_eq!(nearest[0].amenity.name, "Brew Lab");
/// ```
#[derive(Debug, Clone)]
pub struct QueryEngine {
    catalog: Arc<Catalog>,
}

impl QueryEngine {
    /// Serve queries from `catalog`.
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// The catalog being queried.
    #[must_use]
    pub const fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Up to `limit` amenities ordered by distance from the origin, then id.
    ///
    /// With an area, only amenities inside it are eligible and the filter is
    /// applied before truncation. Never returns more than [`MAX_LIMIT`].
    pub fn nearest_amenities(
        &self,
        request: &NearestRequest,
    ) -> Result<Vec<NearbyAmenity>, QueryError> {
        let snapshot = self.catalog.snapshot();
        let origin = request.origin();
        let limit = request.limit().min(MAX_LIMIT);

        let mut hits: Vec<NearbyAmenity> = match request.area() {
            Some(area_id) => {
                let area = resolve_area(&snapshot, area_id)?;
                snapshot
                    .amenities
                    .candidates(&area.bounding_box())
                    .into_iter()
                    .filter(|amenity| area.contains(amenity.location))
                    .map(|amenity| ranked(origin, amenity))
                    .collect()
            }
            None => nearest_unrestricted(&snapshot, origin, limit),
        };

        hits.sort_by(by_distance_then_id);
        hits.truncate(limit);
        Ok(hits)
    }

    /// Amenities inside the area, ascending by id.
    pub fn amenities_within_area(&self, request: &AreaRequest) -> Result<Vec<Amenity>, QueryError> {
        let snapshot = self.catalog.snapshot();
        let area = resolve_area(&snapshot, request.area)?;
        Ok(snapshot
            .amenities
            .candidates(&area.bounding_box())
            .into_iter()
            .filter(|amenity| area.contains(amenity.location))
            .cloned()
            .collect())
    }

    /// Routes whose path crosses, touches or lies inside the area, ascending
    /// by id.
    pub fn routes_intersecting_area(&self, request: &AreaRequest) -> Result<Vec<Route>, QueryError> {
        let snapshot = self.catalog.snapshot();
        let area = resolve_area(&snapshot, request.area)?;
        Ok(snapshot
            .routes
            .candidates(&area.bounding_box())
            .into_iter()
            .filter(|route| route.intersects(&area.boundary))
            .cloned()
            .collect())
    }

    /// Amenities no farther than the radius from the origin, ascending by id,
    /// optionally restricted to an area.
    pub fn amenities_within_radius(
        &self,
        request: &RadiusRequest,
    ) -> Result<Vec<NearbyAmenity>, QueryError> {
        let snapshot = self.catalog.snapshot();
        let area = request
            .area()
            .map(|id| resolve_area(&snapshot, id))
            .transpose()?;
        let metres = request.radius_metres();

        Ok(snapshot
            .amenities
            .candidates(&radius_envelope(request.origin(), metres))
            .into_iter()
            .map(|amenity| ranked(request.origin(), amenity))
            .filter(|hit| hit.distance_m <= metres)
            .filter(|hit| area.is_none_or(|area| area.contains(hit.amenity.location)))
            .collect())
    }
}

fn resolve_area(snapshot: &CatalogSnapshot, id: AreaId) -> Result<&Area, QueryError> {
    snapshot
        .areas
        .get(id)
        .ok_or(QueryError::AreaNotFound { id })
}

fn ranked(origin: Location, amenity: &Amenity) -> NearbyAmenity {
    NearbyAmenity {
        distance_m: distance(origin, amenity.location),
        amenity: amenity.clone(),
    }
}

fn by_distance_then_id(a: &NearbyAmenity, b: &NearbyAmenity) -> Ordering {
    a.distance_m
        .total_cmp(&b.distance_m)
        .then_with(|| a.amenity.id.cmp(&b.amenity.id))
}

// Seeds a radius from the index's nearest boxes, then gathers every amenity
// within that radius so exact re-ranking sees all true contenders.
fn nearest_unrestricted(
    snapshot: &CatalogSnapshot,
    origin: Location,
    limit: usize,
) -> Vec<NearbyAmenity> {
    let seed_radius = snapshot
        .amenities
        .nearest_candidates(origin, limit)
        .into_iter()
        .map(|amenity| distance(origin, amenity.location))
        .max_by(f64::total_cmp);
    let Some(radius) = seed_radius else {
        return Vec::new();
    };

    snapshot
        .amenities
        .candidates(&radius_envelope(origin, radius))
        .into_iter()
        .map(|amenity| ranked(origin, amenity))
        .filter(|hit| hit.distance_m <= radius)
        .collect()
}
