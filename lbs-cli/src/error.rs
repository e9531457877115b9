//! Error types emitted by the `lbs` CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use lbs_core::{EntityError, ParseCategoryError, QueryError, SqliteGeoStoreError, features::FeatureError};
use lbs_data::IngestError;
use thiserror::Error;

/// Errors emitted by the `lbs` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option value could not be interpreted.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: String,
    },
    /// The category name is not one of the supported categories.
    #[error(transparent)]
    Category(#[from] ParseCategoryError),
    /// Opening or writing the SQLite store failed.
    #[error("store at {path:?} failed: {source}")]
    Store {
        path: Utf8PathBuf,
        #[source]
        source: SqliteGeoStoreError,
    },
    /// The new amenity or area failed validation.
    #[error(transparent)]
    Entity(#[from] EntityError),
    /// A query was rejected.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Route ingestion failed.
    #[error(transparent)]
    Ingest(#[from] IngestError),
    /// Reading an area boundary file failed.
    #[error("failed to read boundary file at {path:?}: {source}")]
    ReadBoundary {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The boundary file held no usable polygon.
    #[error("boundary file at {path:?} is not a usable polygon: {source}")]
    ParseBoundary {
        path: Utf8PathBuf,
        #[source]
        source: FeatureError,
    },
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
