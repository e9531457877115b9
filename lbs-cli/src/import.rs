//! `import-routes` command.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use lbs_data::{ImportOptions, IngestReport, SourceLayout, import_routes};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::write_line;
use crate::{ARG_BASE_DIR, ARG_DATA_DIR, ARG_DATABASE, CliError, database_or_default, open_store};

/// CLI arguments for the `import-routes` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Import LineString and MultiLineString features as routes. \
                 Routes are upserted by name, so re-running an import updates \
                 paths instead of duplicating them. Without explicit paths \
                 every routes_*.geojson file in the data directory is read.",
    about = "Import GeoJSON route files"
)]
#[ortho_config(prefix = "LBS")]
pub(crate) struct ImportRoutesArgs {
    /// GeoJSON files; relative paths are tried under the base directory,
    /// then the data directory.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) paths: Vec<String>,
    /// Delete every existing route before importing.
    #[arg(long)]
    #[serde(default)]
    pub(crate) reset: bool,
    /// Project root used to resolve relative paths (default: current dir).
    #[arg(long = ARG_BASE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) base_dir: Option<Utf8PathBuf>,
    /// Directory holding bundled route files (default: `<base-dir>/data`).
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
    /// SQLite database to write.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl ImportRoutesArgs {
    fn into_config(self) -> Result<ImportRoutesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(ImportRoutesConfig::from(merged))
    }
}

/// Resolved `import-routes` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportRoutesConfig {
    pub(crate) paths: Vec<String>,
    pub(crate) options: ImportOptions,
    pub(crate) layout: SourceLayout,
    pub(crate) database: Utf8PathBuf,
}

impl From<ImportRoutesArgs> for ImportRoutesConfig {
    fn from(args: ImportRoutesArgs) -> Self {
        let mut layout =
            SourceLayout::rooted_at(args.base_dir.unwrap_or_else(|| Utf8PathBuf::from(".")));
        if let Some(data_dir) = args.data_dir {
            layout.data_dir = data_dir;
        }
        Self {
            paths: args.paths,
            options: ImportOptions { reset: args.reset },
            layout,
            database: database_or_default(args.database),
        }
    }
}

pub(crate) fn run_import(args: ImportRoutesArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_import(&config)?;
    write_report(writer, &report)
}

pub(crate) fn execute_import(config: &ImportRoutesConfig) -> Result<IngestReport, CliError> {
    // Resolve before opening the store so a bad path never triggers a reset.
    let files = config.layout.resolve(&config.paths)?;
    let mut store = open_store(&config.database)?;
    import_routes(&mut store, &files, config.options).map_err(CliError::from)
}

fn write_report(writer: &mut dyn Write, report: &IngestReport) -> Result<(), CliError> {
    if let Some(deleted) = report.deleted {
        write_line(writer, &format!("Deleted {deleted} existing routes."))?;
    }
    for warning in &report.warnings {
        write_line(writer, warning)?;
    }
    for upsert in &report.routes {
        write_line(
            writer,
            &format!("{} route: {}", upsert.outcome.verb(), upsert.route.name),
        )?;
    }
    write_line(writer, &report.summary())
}
