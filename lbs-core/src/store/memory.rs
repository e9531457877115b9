//! In-process store used by tests, benches and short-lived tools.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{EntityWriter, GeoStore, RouteUpsert, RouteWriter, UpsertOutcome};
use crate::area::AREA_NAME_MAX;
use crate::entity::validated_name;
use crate::route::validated_route_name;
use crate::{
    Amenity, AmenityDraft, AmenityId, Area, AreaId, Boundary, EntityError, Polyline, Route,
    RouteId,
};

/// Errors raised by [`MemoryGeoStore`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MemoryGeoStoreError {
    /// A record failed validation.
    #[error(transparent)]
    Entity(#[from] EntityError),
    /// A unique name was already taken.
    #[error("{kind} named '{name}' already exists")]
    DuplicateName {
        /// Entity kind.
        kind: &'static str,
        /// Conflicting name.
        name: String,
    },
}

/// `BTreeMap`-backed store assigning sequential ids from 1.
#[derive(Debug, Default, Clone)]
pub struct MemoryGeoStore {
    amenities: BTreeMap<AmenityId, Amenity>,
    areas: BTreeMap<AreaId, Area>,
    routes: BTreeMap<RouteId, Route>,
    next_id: u64,
}

impl MemoryGeoStore {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl GeoStore for MemoryGeoStore {
    type Error = MemoryGeoStoreError;

    fn list_amenities(&self) -> Result<Vec<Amenity>, Self::Error> {
        Ok(self.amenities.values().cloned().collect())
    }

    fn list_areas(&self) -> Result<Vec<Area>, Self::Error> {
        Ok(self.areas.values().cloned().collect())
    }

    fn list_routes(&self) -> Result<Vec<Route>, Self::Error> {
        Ok(self.routes.values().cloned().collect())
    }

    fn get_area(&self, id: AreaId) -> Result<Option<Area>, Self::Error> {
        Ok(self.areas.get(&id).cloned())
    }
}

impl RouteWriter for MemoryGeoStore {
    fn upsert_route(&mut self, name: &str, path: Polyline) -> Result<RouteUpsert, Self::Error> {
        let name = validated_route_name(name)?;
        if let Some(existing) = self.routes.values_mut().find(|route| route.name == name) {
            existing.path = path;
            return Ok(RouteUpsert {
                route: existing.clone(),
                outcome: UpsertOutcome::Updated,
            });
        }
        let id = RouteId::new(self.allocate());
        let route = Route { id, name, path };
        self.routes.insert(id, route.clone());
        Ok(RouteUpsert {
            route,
            outcome: UpsertOutcome::Created,
        })
    }

    fn delete_all_routes(&mut self) -> Result<usize, Self::Error> {
        let count = self.routes.len();
        self.routes.clear();
        Ok(count)
    }
}

impl EntityWriter for MemoryGeoStore {
    fn insert_amenity(&mut self, draft: AmenityDraft) -> Result<Amenity, Self::Error> {
        let amenity = draft.into_amenity(AmenityId::new(self.allocate()));
        self.amenities.insert(amenity.id, amenity.clone());
        Ok(amenity)
    }

    fn insert_area(&mut self, name: &str, boundary: Boundary) -> Result<Area, Self::Error> {
        let name = validated_name("area", name, AREA_NAME_MAX)?;
        if self.areas.values().any(|area| area.name == name) {
            return Err(MemoryGeoStoreError::DuplicateName { kind: "area", name });
        }
        let area = Area {
            id: AreaId::new(self.allocate()),
            name,
            boundary,
        };
        self.areas.insert(area.id, area.clone());
        Ok(area)
    }

    fn delete_amenity(&mut self, id: AmenityId) -> Result<bool, Self::Error> {
        Ok(self.amenities.remove(&id).is_some())
    }

    fn delete_area(&mut self, id: AreaId) -> Result<bool, Self::Error> {
        Ok(self.areas.remove(&id).is_some())
    }

    fn delete_route(&mut self, id: RouteId) -> Result<bool, Self::Error> {
        Ok(self.routes.remove(&id).is_some())
    }
}
