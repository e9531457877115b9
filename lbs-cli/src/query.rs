//! The four spatial query commands.
//!
//! Options are passed to the engine as raw strings so the CLI rejects the
//! same inputs, with the same messages, as any other transport.

use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use lbs_core::features::feature_collection;
use lbs_core::query::{AreaRequest, NearestRequest, RadiusRequest};
use lbs_core::{Catalog, QueryEngine, QueryParams};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::write_json;
use crate::{ARG_DATABASE, CliError, database_or_default, open_store};

/// CLI arguments for the `nearest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Find the amenities nearest to a point")]
#[ortho_config(prefix = "LBS")]
pub(crate) struct NearestArgs {
    /// Latitude of the origin.
    #[arg(long, allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<String>,
    /// Longitude of the origin.
    #[arg(long, allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lng: Option<String>,
    /// Maximum number of results (default 10, capped at 100).
    #[arg(long, allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) limit: Option<String>,
    /// Only consider amenities inside this area.
    #[arg(long = "area-id")]
    #[serde(default)]
    pub(crate) area_id: Option<String>,
    /// SQLite database to query.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// CLI arguments for the `within` and `intersecting` subcommands.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Query against a stored area")]
#[ortho_config(prefix = "LBS")]
pub(crate) struct AreaArgs {
    /// Area to query.
    #[arg(long = "area-id")]
    #[serde(default)]
    pub(crate) area_id: Option<String>,
    /// SQLite database to query.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// CLI arguments for the `radius` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Find amenities within a radius of a point")]
#[ortho_config(prefix = "LBS")]
pub(crate) struct RadiusArgs {
    /// Latitude of the origin.
    #[arg(long, allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<String>,
    /// Longitude of the origin.
    #[arg(long, allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lng: Option<String>,
    /// Radius in kilometres (default 1.0).
    #[arg(long, allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) km: Option<String>,
    /// Only consider amenities inside this area.
    #[arg(long = "area-id")]
    #[serde(default)]
    pub(crate) area_id: Option<String>,
    /// SQLite database to query.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

fn params<const N: usize>(pairs: [(&str, Option<String>); N]) -> QueryParams {
    QueryParams::from_pairs(
        pairs
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value))),
    )
}

fn engine(database: &Utf8Path) -> Result<QueryEngine, CliError> {
    let store = open_store(database)?;
    let catalog = Catalog::load(&store).map_err(|source| CliError::Store {
        path: database.to_path_buf(),
        source,
    })?;
    Ok(QueryEngine::new(Arc::new(catalog)))
}

pub(crate) fn run_nearest(args: NearestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let request = NearestRequest::from_params(&params([
        ("lat", merged.lat),
        ("lng", merged.lng),
        ("limit", merged.limit),
        ("area_id", merged.area_id),
    ]))?;
    let hits = engine(&database_or_default(merged.database))?.nearest_amenities(&request)?;
    write_json(writer, &feature_collection(&hits))
}

fn area_request(args: AreaArgs) -> Result<(AreaRequest, Utf8PathBuf), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let request = AreaRequest::from_params(&params([("area_id", merged.area_id)]))?;
    Ok((request, database_or_default(merged.database)))
}

pub(crate) fn run_within(args: AreaArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let (request, database) = area_request(args)?;
    let amenities = engine(&database)?.amenities_within_area(&request)?;
    write_json(writer, &feature_collection(&amenities))
}

pub(crate) fn run_intersecting(args: AreaArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let (request, database) = area_request(args)?;
    let routes = engine(&database)?.routes_intersecting_area(&request)?;
    write_json(writer, &feature_collection(&routes))
}

pub(crate) fn run_radius(args: RadiusArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let request = RadiusRequest::from_params(&params([
        ("lat", merged.lat),
        ("lng", merged.lng),
        ("km", merged.km),
        ("area_id", merged.area_id),
    ]))?;
    let hits = engine(&database_or_default(merged.database))?.amenities_within_radius(&request)?;
    write_json(writer, &feature_collection(&hits))
}
