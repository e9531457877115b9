//! Commands that populate and inspect the store.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use lbs_core::features::{ToFeature, boundary_from_geojson, feature_collection};
use lbs_core::{AmenityDraft, AmenityFilter, Category, EntityWriter, GeoStore};
use lbs_data::read_utf8_file;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::write_json;
use crate::{
    ARG_BOUNDARY, ARG_CATEGORY, ARG_DATABASE, ARG_LAT, ARG_LNG, ARG_NAME, CliError,
    ENV_AMENITY_CATEGORY, ENV_AMENITY_LAT, ENV_AMENITY_LNG, ENV_AMENITY_NAME, ENV_AREA_BOUNDARY,
    ENV_AREA_NAME, database_or_default, open_store,
};

/// CLI arguments for the `add-amenity` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Store a new amenity")]
#[ortho_config(prefix = "LBS")]
pub(crate) struct AddAmenityArgs {
    /// Display name.
    #[arg(long = ARG_NAME)]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// One of cafe, gym, atm, park, shop.
    #[arg(long = ARG_CATEGORY)]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Latitude in degrees.
    #[arg(long = ARG_LAT, allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude in degrees.
    #[arg(long = ARG_LNG, allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lng: Option<f64>,
    /// Free-text description.
    #[arg(long)]
    #[serde(default)]
    pub(crate) description: Option<String>,
    /// SQLite database to write.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved `add-amenity` configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AddAmenityConfig {
    pub(crate) draft: AmenityDraft,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<AddAmenityArgs> for AddAmenityConfig {
    type Error = CliError;

    fn try_from(args: AddAmenityArgs) -> Result<Self, Self::Error> {
        let name = args.name.ok_or(CliError::MissingArgument {
            field: ARG_NAME,
            env: ENV_AMENITY_NAME,
        })?;
        let category: Category = args
            .category
            .ok_or(CliError::MissingArgument {
                field: ARG_CATEGORY,
                env: ENV_AMENITY_CATEGORY,
            })?
            .parse()?;
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_AMENITY_LAT,
        })?;
        let lng = args.lng.ok_or(CliError::MissingArgument {
            field: ARG_LNG,
            env: ENV_AMENITY_LNG,
        })?;
        let mut draft = AmenityDraft::new(&name, category, lng, lat)?;
        if let Some(description) = args.description {
            draft = draft.with_description(description);
        }
        Ok(Self {
            draft,
            database: database_or_default(args.database),
        })
    }
}

pub(crate) fn run_add_amenity(args: AddAmenityArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = AddAmenityConfig::try_from(merged)?;
    let mut store = open_store(&config.database)?;
    let amenity = store
        .insert_amenity(config.draft)
        .map_err(|source| CliError::Store {
            path: config.database.clone(),
            source,
        })?;
    write_json(writer, &amenity.to_feature())
}

/// CLI arguments for the `add-area` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Store a new area. The boundary file holds a GeoJSON Polygon \
                 geometry, or a Feature or FeatureCollection whose first \
                 geometry is a Polygon; only the outer ring is used.",
    about = "Store a new area"
)]
#[ortho_config(prefix = "LBS")]
pub(crate) struct AddAreaArgs {
    /// Unique area name.
    #[arg(long = ARG_NAME)]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// GeoJSON file holding the boundary polygon.
    #[arg(long = ARG_BOUNDARY, value_name = "path")]
    #[serde(default)]
    pub(crate) boundary: Option<Utf8PathBuf>,
    /// SQLite database to write.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Resolved `add-area` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddAreaConfig {
    pub(crate) name: String,
    pub(crate) boundary: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<AddAreaArgs> for AddAreaConfig {
    type Error = CliError;

    fn try_from(args: AddAreaArgs) -> Result<Self, Self::Error> {
        let name = args.name.ok_or(CliError::MissingArgument {
            field: ARG_NAME,
            env: ENV_AREA_NAME,
        })?;
        let boundary = args.boundary.ok_or(CliError::MissingArgument {
            field: ARG_BOUNDARY,
            env: ENV_AREA_BOUNDARY,
        })?;
        Ok(Self {
            name,
            boundary,
            database: database_or_default(args.database),
        })
    }
}

pub(crate) fn run_add_area(args: AddAreaArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = AddAreaConfig::try_from(merged)?;
    let text = read_utf8_file(&config.boundary).map_err(|source| CliError::ReadBoundary {
        path: config.boundary.clone(),
        source,
    })?;
    let boundary = boundary_from_geojson(&text).map_err(|source| CliError::ParseBoundary {
        path: config.boundary.clone(),
        source,
    })?;
    let mut store = open_store(&config.database)?;
    let area = store
        .insert_area(&config.name, boundary)
        .map_err(|source| CliError::Store {
            path: config.database.clone(),
            source,
        })?;
    write_json(writer, &area.to_feature())
}

/// CLI arguments for the `list-amenities` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "List stored amenities")]
#[ortho_config(prefix = "LBS")]
pub(crate) struct ListAmenitiesArgs {
    /// Only amenities of this category.
    #[arg(long = ARG_CATEGORY)]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Case-insensitive text matched against name, description and category.
    #[arg(long)]
    #[serde(default)]
    pub(crate) search: Option<String>,
    /// SQLite database to read.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

pub(crate) fn run_list_amenities(
    args: ListAmenitiesArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let filter = AmenityFilter {
        category: merged.category.as_deref().map(str::parse).transpose()?,
        search: merged.search,
    };
    let database = database_or_default(merged.database);
    let store = open_store(&database)?;
    let amenities = store
        .list_amenities_matching(&filter)
        .map_err(|source| CliError::Store {
            path: database.clone(),
            source,
        })?;
    write_json(writer, &feature_collection(&amenities))
}
