//! Command-line interface for the location lookup engine.
//!
//! Every subcommand opens the SQLite store, so the same `--database` flag
//! (or `LBS_*` environment variable, or config file entry) applies across
//! route import, the four spatial queries and the seeding commands.
#![forbid(unsafe_code)]

use std::ffi::OsString;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use lbs_core::SqliteGeoStore;
use log::debug;

mod error;
mod import;
mod output;
mod query;
mod seed;

pub use error::CliError;

use import::ImportRoutesArgs;
use query::{AreaArgs, NearestArgs, RadiusArgs};
use seed::{AddAmenityArgs, AddAreaArgs, ListAmenitiesArgs};

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_BASE_DIR: &str = "base-dir";
pub(crate) const ARG_DATA_DIR: &str = "data-dir";
pub(crate) const ARG_NAME: &str = "name";
pub(crate) const ARG_CATEGORY: &str = "category";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LNG: &str = "lng";
pub(crate) const ARG_BOUNDARY: &str = "boundary";
pub(crate) const ENV_AMENITY_NAME: &str = "LBS_CMDS_ADD_AMENITY_NAME";
pub(crate) const ENV_AMENITY_CATEGORY: &str = "LBS_CMDS_ADD_AMENITY_CATEGORY";
pub(crate) const ENV_AMENITY_LAT: &str = "LBS_CMDS_ADD_AMENITY_LAT";
pub(crate) const ENV_AMENITY_LNG: &str = "LBS_CMDS_ADD_AMENITY_LNG";
pub(crate) const ENV_AREA_NAME: &str = "LBS_CMDS_ADD_AREA_NAME";
pub(crate) const ENV_AREA_BOUNDARY: &str = "LBS_CMDS_ADD_AREA_BOUNDARY";

/// Database used when no `--database` is configured.
pub const DEFAULT_DATABASE: &str = "lbs.db";

/// Run the CLI with the current process arguments, writing to stdout.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, the store or
/// the command itself fails.
pub fn run() -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_with(std::env::args_os(), &mut stdout)
}

/// Run the CLI with explicit arguments (program name first) and output sink.
///
/// # Errors
/// See [`run`].
pub fn run_with<I, T>(args: I, writer: &mut dyn Write) -> Result<(), CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    match cli.command {
        Command::ImportRoutes(args) => import::run_import(args, writer),
        Command::Nearest(args) => query::run_nearest(args, writer),
        Command::Within(args) => query::run_within(args, writer),
        Command::Intersecting(args) => query::run_intersecting(args, writer),
        Command::Radius(args) => query::run_radius(args, writer),
        Command::AddAmenity(args) => seed::run_add_amenity(args, writer),
        Command::AddArea(args) => seed::run_add_area(args, writer),
        Command::ListAmenities(args) => seed::run_list_amenities(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "lbs",
    about = "Spatial lookups over amenities, areas and routes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import GeoJSON route files into the store.
    ImportRoutes(ImportRoutesArgs),
    /// Nearest amenities to a point.
    Nearest(NearestArgs),
    /// Amenities inside an area.
    Within(AreaArgs),
    /// Routes crossing an area.
    Intersecting(AreaArgs),
    /// Amenities within a radius of a point.
    Radius(RadiusArgs),
    /// Store a new amenity.
    AddAmenity(AddAmenityArgs),
    /// Store a new area from a GeoJSON polygon file.
    AddArea(AddAreaArgs),
    /// List stored amenities, optionally filtered.
    ListAmenities(ListAmenitiesArgs),
}

pub(crate) fn database_or_default(database: Option<Utf8PathBuf>) -> Utf8PathBuf {
    database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE))
}

pub(crate) fn open_store(path: &Utf8Path) -> Result<SqliteGeoStore, CliError> {
    debug!("opening store at {path}");
    SqliteGeoStore::open(path).map_err(|source| CliError::Store {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests;
