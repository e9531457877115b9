//! Core types for the location lookup engine.
//!
//! Amenities (points), areas (polygons) and routes (polylines) live in a
//! durable store behind the [`GeoStore`] traits. A [`Catalog`] mirrors them
//! into per-kind R\*-tree layers, and the [`query::QueryEngine`] answers the
//! four spatial lookups by pre-filtering on bounding boxes and refining with
//! the exact predicates in [`geometry`].

#![cfg_attr(docsrs, feature(doc_cfg))]

mod amenity;
mod area;
pub mod catalog;
mod entity;
pub mod features;
pub mod geometry;
mod index;
pub mod query;
mod route;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use amenity::{AMENITY_NAME_MAX, Amenity, AmenityDraft, AmenityFilter, Category, ParseCategoryError};
pub use area::{AREA_NAME_MAX, Area};
pub use catalog::{Catalog, CatalogSnapshot, Layer, SharedLayer};
pub use entity::{AmenityId, AreaId, Entity, EntityError, RouteId};
pub use geometry::{Boundary, BoundingBox, GeometryError, Location, Polyline};
pub use index::{IndexEntry, SpatialIndex};
pub use query::{NearbyAmenity, QueryEngine, QueryError, QueryErrorKind, QueryParams};
pub use route::{ROUTE_NAME_MAX, Route, validated_route_name};
pub use store::{
    EntityWriter, GeoStore, MemoryGeoStore, MemoryGeoStoreError, RouteUpsert, RouteWriter,
    UpsertOutcome,
};
#[cfg(feature = "store-sqlite")]
pub use store::{SqliteGeoStore, SqliteGeoStoreError};
