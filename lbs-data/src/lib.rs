//! Route ingestion for the location lookup engine.
//!
//! Responsibilities:
//! - Resolve GeoJSON source files against the project and data directories.
//! - Normalise `LineString` and `MultiLineString` features into routes.
//! - Upsert routes through [`lbs_core::RouteWriter`] and report the outcome.
//!
//! Boundaries:
//! - Geometry validation and route invariants live in `lbs-core`.
//! - The pipeline never refreshes a query catalogue; callers apply
//!   [`IngestReport::routes`] to one if they hold it.

#![forbid(unsafe_code)]

pub mod ingest;
pub mod sources;

pub use ingest::{ImportOptions, IngestError, IngestReport, import_routes};
pub use sources::{SourceLayout, read_source, read_utf8_file};
