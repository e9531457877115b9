//! Durable store contracts.
//!
//! The engine never owns persistence. It reads entities through [`GeoStore`]
//! and the ingestion pipeline writes routes through [`RouteWriter`]. Seeding
//! tools use [`EntityWriter`] for the remaining CRUD operations.

use std::error::Error;

use crate::{
    Amenity, AmenityDraft, AmenityFilter, AmenityId, Area, AreaId, Boundary, Polyline, Route,
    RouteId,
};

mod memory;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use memory::{MemoryGeoStore, MemoryGeoStoreError};
#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteGeoStore, SqliteGeoStoreError};

/// Read access to stored amenities, areas and routes.
///
/// Listings are returned in ascending id order.
pub trait GeoStore {
    /// Failure reported by the backing store.
    type Error: Error + Send + Sync + 'static;

    /// Every stored amenity.
    fn list_amenities(&self) -> Result<Vec<Amenity>, Self::Error>;

    /// Amenities passing `filter`.
    fn list_amenities_matching(&self, filter: &AmenityFilter) -> Result<Vec<Amenity>, Self::Error> {
        let mut amenities = self.list_amenities()?;
        amenities.retain(|amenity| filter.matches(amenity));
        Ok(amenities)
    }

    /// Every stored area.
    fn list_areas(&self) -> Result<Vec<Area>, Self::Error>;

    /// Every stored route.
    fn list_routes(&self) -> Result<Vec<Route>, Self::Error>;

    /// Look up one area.
    fn get_area(&self, id: AreaId) -> Result<Option<Area>, Self::Error>;
}

/// Whether an upsert inserted a new record or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No route had the name; one was inserted.
    Created,
    /// A route with the name existed; its path was replaced.
    Updated,
}

impl UpsertOutcome {
    /// Past-tense verb used in reports.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Updated => "Updated",
        }
    }
}

/// A route as stored after an upsert, with the branch taken.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteUpsert {
    /// Stored route.
    pub route: Route,
    /// Insert or replace.
    pub outcome: UpsertOutcome,
}

/// Route writes used by ingestion.
pub trait RouteWriter: GeoStore {
    /// Insert a route named `name`, or replace the path of the existing one.
    ///
    /// The name is trimmed before it is used as the key. Each call is atomic.
    fn upsert_route(&mut self, name: &str, path: Polyline) -> Result<RouteUpsert, Self::Error>;

    /// Delete every route, returning how many were removed.
    fn delete_all_routes(&mut self) -> Result<usize, Self::Error>;
}

/// CRUD writes for amenities, areas and individual routes.
pub trait EntityWriter: RouteWriter {
    /// Store a new amenity and assign its id.
    fn insert_amenity(&mut self, draft: AmenityDraft) -> Result<Amenity, Self::Error>;

    /// Store a new area; names must be unique.
    fn insert_area(&mut self, name: &str, boundary: Boundary) -> Result<Area, Self::Error>;

    /// Delete an amenity. Returns `false` when it did not exist.
    fn delete_amenity(&mut self, id: AmenityId) -> Result<bool, Self::Error>;

    /// Delete an area. Returns `false` when it did not exist.
    fn delete_area(&mut self, id: AreaId) -> Result<bool, Self::Error>;

    /// Delete a route. Returns `false` when it did not exist.
    fn delete_route(&mut self, id: RouteId) -> Result<bool, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Category;
    use rstest::rstest;

    #[rstest]
    fn default_filtered_listing_applies_filter() {
        let mut store = MemoryGeoStore::default();
        for (name, category) in [("Brew Lab", Category::Cafe), ("Lift Hub", Category::Gym)] {
            let draft = AmenityDraft::new(name, category, -6.26, 53.35).expect("valid draft");
            store.insert_amenity(draft).expect("insert amenity");
        }
        let filter = AmenityFilter {
            category: Some(Category::Gym),
            search: None,
        };
        let names: Vec<_> = store
            .list_amenities_matching(&filter)
            .expect("list amenities")
            .into_iter()
            .map(|amenity| amenity.name)
            .collect();
        assert_eq!(names, vec!["Lift Hub"]);
    }

    #[rstest]
    #[case(UpsertOutcome::Created, "Created")]
    #[case(UpsertOutcome::Updated, "Updated")]
    fn outcome_verbs(#[case] outcome: UpsertOutcome, #[case] verb: &str) {
        assert_eq!(outcome.verb(), verb);
    }
}
