//! SQLite-backed store.
//!
//! Geometries are stored as JSON arrays of `[lon, lat]` pairs. Area and route
//! names carry `UNIQUE` constraints; route upserts run inside a transaction.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use geo::Coord;
use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;

use super::{EntityWriter, GeoStore, RouteUpsert, RouteWriter, UpsertOutcome};
use crate::amenity::ParseCategoryError;
use crate::area::AREA_NAME_MAX;
use crate::entity::validated_name;
use crate::geometry::Location;
use crate::route::validated_route_name;
use crate::{
    Amenity, AmenityDraft, AmenityId, Area, AreaId, Boundary, Category, EntityError, Polyline,
    Route, RouteId,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS amenities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    category    TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    lon         REAL NOT NULL,
    lat         REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS areas (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL UNIQUE,
    boundary TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS routes (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    path TEXT NOT NULL
);
";

/// Errors raised by [`SqliteGeoStore`].
#[derive(Debug, Error)]
pub enum SqliteGeoStoreError {
    /// Opening or initialising the database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Stored coordinates were not a JSON array of `[lon, lat]` pairs.
    #[error("failed to decode geometry for {kind} {id}: {source}")]
    DecodeGeometry {
        /// Entity kind.
        kind: &'static str,
        /// Row identifier.
        id: u64,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// Coordinates could not be encoded as JSON.
    #[error("failed to encode geometry: {0}")]
    EncodeGeometry(#[source] serde_json::Error),
    /// A stored row no longer passes validation.
    #[error("stored {kind} {id} is invalid: {source}")]
    InvalidRecord {
        /// Entity kind.
        kind: &'static str,
        /// Row identifier.
        id: u64,
        /// Validation failure.
        #[source]
        source: EntityError,
    },
    /// A stored amenity carried an unknown category.
    #[error("stored amenity {id} has an invalid category: {source}")]
    InvalidCategory {
        /// Row identifier.
        id: u64,
        /// Parse failure.
        #[source]
        source: ParseCategoryError,
    },
    /// Input failed validation before reaching the database.
    #[error(transparent)]
    Validation(#[from] EntityError),
    /// A unique name was already taken.
    #[error("{kind} named '{name}' already exists")]
    DuplicateName {
        /// Entity kind.
        kind: &'static str,
        /// Conflicting name.
        name: String,
    },
    /// Generic SQLite failure.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

/// Store persisting entities in a single SQLite database.
pub struct SqliteGeoStore {
    connection: Connection,
}

impl fmt::Debug for SqliteGeoStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteGeoStore")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

impl SqliteGeoStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteGeoStoreError> {
        let path = path.as_ref();
        let open_error = |source| SqliteGeoStoreError::OpenDatabase {
            path: path.to_path_buf(),
            source,
        };
        let connection = Connection::open(path).map_err(open_error)?;
        connection.execute_batch(SCHEMA).map_err(open_error)?;
        Ok(Self { connection })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteGeoStoreError> {
        let connection = Connection::open_in_memory()?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self { connection })
    }
}

fn encode_positions(positions: &[Location]) -> Result<String, SqliteGeoStoreError> {
    let pairs: Vec<[f64; 2]> = positions.iter().map(|p| [p.x, p.y]).collect();
    serde_json::to_string(&pairs).map_err(SqliteGeoStoreError::EncodeGeometry)
}

fn decode_positions(
    kind: &'static str,
    id: u64,
    json: &str,
) -> Result<Vec<Location>, SqliteGeoStoreError> {
    let pairs: Vec<[f64; 2]> = serde_json::from_str(json)
        .map_err(|source| SqliteGeoStoreError::DecodeGeometry { kind, id, source })?;
    Ok(pairs.into_iter().map(|[x, y]| Coord { x, y }).collect())
}

fn invalid(kind: &'static str, id: u64) -> impl Fn(EntityError) -> SqliteGeoStoreError {
    move |source| SqliteGeoStoreError::InvalidRecord { kind, id, source }
}

struct AmenityRow {
    id: u64,
    name: String,
    category: String,
    description: String,
    lon: f64,
    lat: f64,
}

impl AmenityRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            description: row.get(3)?,
            lon: row.get(4)?,
            lat: row.get(5)?,
        })
    }

    fn into_amenity(self) -> Result<Amenity, SqliteGeoStoreError> {
        let id = self.id;
        let category: Category = self
            .category
            .parse()
            .map_err(|source| SqliteGeoStoreError::InvalidCategory { id, source })?;
        let draft = AmenityDraft::new(&self.name, category, self.lon, self.lat)
            .map_err(invalid("amenity", id))?
            .with_description(self.description);
        Ok(draft.into_amenity(AmenityId::new(id)))
    }
}

fn shape_row(row: &Row<'_>) -> rusqlite::Result<(u64, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn area_from_row((id, name, json): (u64, String, String)) -> Result<Area, SqliteGeoStoreError> {
    let positions = decode_positions("area", id, &json)?;
    let boundary = Boundary::new(positions).map_err(|e| invalid("area", id)(e.into()))?;
    Area::new(AreaId::new(id), &name, boundary).map_err(invalid("area", id))
}

fn route_from_row((id, name, json): (u64, String, String)) -> Result<Route, SqliteGeoStoreError> {
    let positions = decode_positions("route", id, &json)?;
    let path = Polyline::new(positions).map_err(|e| invalid("route", id)(e.into()))?;
    Route::new(RouteId::new(id), &name, path).map_err(invalid("route", id))
}

impl GeoStore for SqliteGeoStore {
    type Error = SqliteGeoStoreError;

    fn list_amenities(&self) -> Result<Vec<Amenity>, Self::Error> {
        let mut statement = self.connection.prepare(
            "SELECT id, name, category, description, lon, lat FROM amenities ORDER BY id",
        )?;
        let rows = statement
            .query_map([], AmenityRow::read)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(AmenityRow::into_amenity).collect()
    }

    fn list_areas(&self) -> Result<Vec<Area>, Self::Error> {
        let mut statement = self
            .connection
            .prepare("SELECT id, name, boundary FROM areas ORDER BY id")?;
        let rows = statement
            .query_map([], shape_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(area_from_row).collect()
    }

    fn list_routes(&self) -> Result<Vec<Route>, Self::Error> {
        let mut statement = self
            .connection
            .prepare("SELECT id, name, path FROM routes ORDER BY id")?;
        let rows = statement
            .query_map([], shape_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(route_from_row).collect()
    }

    fn get_area(&self, id: AreaId) -> Result<Option<Area>, Self::Error> {
        self.connection
            .query_row(
                "SELECT id, name, boundary FROM areas WHERE id = ?1",
                params![id.get()],
                shape_row,
            )
            .optional()?
            .map(area_from_row)
            .transpose()
    }
}

impl RouteWriter for SqliteGeoStore {
    fn upsert_route(&mut self, name: &str, path: Polyline) -> Result<RouteUpsert, Self::Error> {
        let name = validated_route_name(name)?;
        let encoded = encode_positions(path.positions())?;

        let tx = self.connection.transaction()?;
        let existing: Option<u64> = tx
            .query_row(
                "SELECT id FROM routes WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        let (id, outcome) = if let Some(id) = existing {
            tx.execute(
                "UPDATE routes SET path = ?1 WHERE id = ?2",
                params![encoded, id],
            )?;
            (id, UpsertOutcome::Updated)
        } else {
            let id: u64 = tx.query_row(
                "INSERT INTO routes (name, path) VALUES (?1, ?2) RETURNING id",
                params![name, encoded],
                |row| row.get(0),
            )?;
            (id, UpsertOutcome::Created)
        };
        tx.commit()?;

        Ok(RouteUpsert {
            route: Route {
                id: RouteId::new(id),
                name,
                path,
            },
            outcome,
        })
    }

    fn delete_all_routes(&mut self) -> Result<usize, Self::Error> {
        Ok(self.connection.execute("DELETE FROM routes", [])?)
    }
}

impl EntityWriter for SqliteGeoStore {
    fn insert_amenity(&mut self, draft: AmenityDraft) -> Result<Amenity, Self::Error> {
        let id: u64 = self.connection.query_row(
            "INSERT INTO amenities (name, category, description, lon, lat)
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
            params![
                draft.name,
                draft.category.as_str(),
                draft.description,
                draft.location.x,
                draft.location.y
            ],
            |row| row.get(0),
        )?;
        Ok(draft.into_amenity(AmenityId::new(id)))
    }

    fn insert_area(&mut self, name: &str, boundary: Boundary) -> Result<Area, Self::Error> {
        let name = validated_name("area", name, AREA_NAME_MAX)?;
        let encoded = encode_positions(boundary.positions())?;

        let tx = self.connection.transaction()?;
        let taken = tx
            .query_row(
                "SELECT 1 FROM areas WHERE name = ?1",
                params![name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if taken {
            return Err(SqliteGeoStoreError::DuplicateName { kind: "area", name });
        }
        let id: u64 = tx.query_row(
            "INSERT INTO areas (name, boundary) VALUES (?1, ?2) RETURNING id",
            params![name, encoded],
            |row| row.get(0),
        )?;
        tx.commit()?;

        Ok(Area {
            id: AreaId::new(id),
            name,
            boundary,
        })
    }

    fn delete_amenity(&mut self, id: AmenityId) -> Result<bool, Self::Error> {
        let removed = self
            .connection
            .execute("DELETE FROM amenities WHERE id = ?1", params![id.get()])?;
        Ok(removed > 0)
    }

    fn delete_area(&mut self, id: AreaId) -> Result<bool, Self::Error> {
        let removed = self
            .connection
            .execute("DELETE FROM areas WHERE id = ?1", params![id.get()])?;
        Ok(removed > 0)
    }

    fn delete_route(&mut self, id: RouteId) -> Result<bool, Self::Error> {
        let removed = self
            .connection
            .execute("DELETE FROM routes WHERE id = ?1", params![id.get()])?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    fn river_walk() -> Polyline {
        Polyline::new(vec![
            Coord { x: -6.27, y: 53.35 },
            Coord { x: -6.21, y: 53.35 },
        ])
        .expect("valid path")
    }

    fn dublin_ring() -> Boundary {
        Boundary::closing(vec![
            Coord { x: -6.28, y: 53.33 },
            Coord { x: -6.20, y: 53.33 },
            Coord { x: -6.20, y: 53.37 },
            Coord { x: -6.28, y: 53.37 },
        ])
        .expect("valid ring")
    }

    #[fixture]
    fn store() -> SqliteGeoStore {
        SqliteGeoStore::open_in_memory().expect("open in-memory store")
    }

    #[rstest]
    fn upsert_is_keyed_by_name(mut store: SqliteGeoStore) {
        let created = store.upsert_route("River Walk", river_walk()).expect("create");
        let updated = store.upsert_route("River Walk", river_walk()).expect("update");
        assert_eq!(created.outcome, UpsertOutcome::Created);
        assert_eq!(updated.outcome, UpsertOutcome::Updated);
        assert_eq!(created.route.id, updated.route.id);
        assert_eq!(store.list_routes().expect("list").len(), 1);
    }

    #[rstest]
    fn geometry_round_trips_through_json(mut store: SqliteGeoStore) {
        let area = store.insert_area("Docklands", dublin_ring()).expect("insert area");
        let loaded = store
            .get_area(area.id)
            .expect("query area")
            .expect("area exists");
        assert_eq!(loaded, area);
    }

    #[rstest]
    fn missing_area_is_none(store: SqliteGeoStore) {
        assert!(store.get_area(AreaId::new(404)).expect("query").is_none());
    }

    #[rstest]
    fn duplicate_area_names_are_rejected(mut store: SqliteGeoStore) {
        store.insert_area("Docklands", dublin_ring()).expect("first");
        let err = store.insert_area("Docklands", dublin_ring()).expect_err("duplicate");
        assert!(matches!(err, SqliteGeoStoreError::DuplicateName { .. }));
    }

    #[rstest]
    fn amenities_keep_category_and_description(mut store: SqliteGeoStore) {
        let draft = AmenityDraft::new("Brew Lab", Category::Cafe, -6.26, 53.35)
            .expect("draft")
            .with_description("Coffee");
        let stored = store.insert_amenity(draft).expect("insert");
        let listed = store.list_amenities().expect("list");
        assert_eq!(listed, vec![stored]);
    }

    #[rstest]
    fn delete_all_routes_counts_rows(mut store: SqliteGeoStore) {
        store.upsert_route("A", river_walk()).expect("A");
        store.upsert_route("B", river_walk()).expect("B");
        assert_eq!(store.delete_all_routes().expect("delete"), 2);
    }

    #[rstest]
    fn corrupt_geometry_is_reported(store: SqliteGeoStore) {
        store
            .connection
            .execute(
                "INSERT INTO routes (name, path) VALUES ('Broken', 'not json')",
                [],
            )
            .expect("insert raw row");
        let err = store.list_routes().expect_err("decode should fail");
        assert!(matches!(
            err,
            SqliteGeoStoreError::DecodeGeometry { kind: "route", .. }
        ));
    }

    #[rstest]
    fn data_survives_reopening() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("lbs.db");
        {
            let mut store = SqliteGeoStore::open(&path).expect("open store");
            store.upsert_route("River Walk", river_walk()).expect("create");
        }
        let store = SqliteGeoStore::open(&path).expect("reopen store");
        let names: Vec<_> = store
            .list_routes()
            .expect("list")
            .into_iter()
            .map(|route| route.name)
            .collect();
        assert_eq!(names, vec!["River Walk"]);
    }
}
