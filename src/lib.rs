//! Facade crate for the location lookup engine.
//!
//! Re-exports the core domain types and query engine, with the SQLite store
//! and the GeoJSON route import pipeline behind feature flags.

#![forbid(unsafe_code)]

pub use lbs_core::{
    Amenity, AmenityDraft, AmenityFilter, AmenityId, Area, AreaId, Boundary, Catalog, Category,
    EntityError, EntityWriter, GeoStore, GeometryError, Location, MemoryGeoStore, NearbyAmenity,
    Polyline, QueryEngine, QueryError, QueryErrorKind, QueryParams, Route, RouteId, RouteWriter,
    features, query,
};

#[cfg(feature = "store-sqlite")]
pub use lbs_core::{SqliteGeoStore, SqliteGeoStoreError};

#[cfg(feature = "ingest")]
pub use lbs_data::{ImportOptions, IngestError, IngestReport, SourceLayout, import_routes};
