//! GeoJSON route ingestion.
//!
//! Reads feature collections of `LineString` and `MultiLineString`
//! geometries, splits them into single-path routes and upserts each one by
//! name. Files are processed sequentially. Feature- and segment-level
//! problems are counted as skips; structurally malformed coordinates abort
//! the run, leaving earlier upserts committed.

use std::error::Error;

use camino::{Utf8Path, Utf8PathBuf};
use lbs_core::{Polyline, RouteUpsert, RouteWriter};
use log::{info, warn};
use thiserror::Error;

use crate::sources::read_source;

mod naming;
mod raw;

use raw::{RawCollection, RawFeature, Segments};

/// Switches for an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Delete every stored route before reading any file.
    pub reset: bool,
}

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    /// Routes removed by `reset`, when it was requested.
    pub deleted: Option<usize>,
    /// Route segments created or updated.
    pub imported: usize,
    /// Features and segments passed over.
    pub skipped: usize,
    /// Every upsert in the order it happened.
    pub routes: Vec<RouteUpsert>,
    /// Per-file and per-feature warnings.
    pub warnings: Vec<String>,
}

impl IngestReport {
    /// One-line summary of the run.
    ///
    /// # Examples
    /// ```
    /// use lbs_data::IngestReport;
    ///
    /// let report = IngestReport { imported: 4, skipped: 1, ..IngestReport::default() };
    /// assert_eq!(report.summary(), "Imported or updated 4 route segments; skipped 1.");
    /// ```
    #[must_use]
    pub fn summary(&self) -> String {
        if self.skipped > 0 {
            format!(
                "Imported or updated {} route segments; skipped {}.",
                self.imported, self.skipped
            )
        } else {
            format!("Imported or updated {} route segments.", self.imported)
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.warnings.push(message);
    }
}

/// Errors that abort an import run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An explicit source path matched no file.
    #[error("GeoJSON file not found: {path}")]
    SourceNotFound { path: String },
    /// No files were available to import.
    #[error("no GeoJSON files found to import")]
    NoSources,
    /// The data directory could not be listed.
    #[error("failed to list GeoJSON files in {path}")]
    ListSources {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A source file could not be read.
    #[error("failed to read {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A source file is not a JSON feature collection.
    #[error("failed to parse {path} as GeoJSON")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A segment's coordinates are structurally invalid.
    #[error("{file} feature {feature} segment {segment}: {reason}")]
    MalformedCoordinates {
        file: Utf8PathBuf,
        feature: usize,
        segment: usize,
        reason: String,
    },
    /// The store refused a route write.
    #[error("failed to store route '{name}'")]
    Store {
        name: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Clearing existing routes failed.
    #[error("failed to delete existing routes")]
    Reset {
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The run finished without importing a single route.
    #[error("no routes were imported")]
    NothingImported,
}

/// Import routes from `files` into `store`.
///
/// `files` should already be resolved (see
/// [`SourceLayout::resolve`](crate::SourceLayout::resolve)) so a bad path
/// fails before `reset` deletes anything.
///
/// # Errors
/// Returns [`IngestError`] when a file cannot be read or parsed, when
/// coordinates are malformed, when the store rejects a write, or when no
/// route was imported at all.
///
/// # Examples
/// ```no_run
/// use lbs_core::MemoryGeoStore;
/// use lbs_data::{ImportOptions, SourceLayout, import_routes};
///
/// # fn main() -> Result<(), lbs_data::IngestError> {
/// let files = SourceLayout::rooted_at(".").resolve::<&str>(&[])?;
/// let mut store = MemoryGeoStore::default();
/// let report = import_routes(&mut store, &files, ImportOptions::default())?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub fn import_routes<S>(
    store: &mut S,
    files: &[Utf8PathBuf],
    options: ImportOptions,
) -> Result<IngestReport, IngestError>
where
    S: RouteWriter,
{
    let mut importer = Importer {
        store,
        report: IngestReport::default(),
    };
    if options.reset {
        importer.reset()?;
    }
    for file in files {
        importer.import_file(file)?;
    }
    let report = importer.report;
    if report.imported == 0 {
        return Err(IngestError::NothingImported);
    }
    info!("{}", report.summary());
    Ok(report)
}

struct Importer<'s, S> {
    store: &'s mut S,
    report: IngestReport,
}

impl<S: RouteWriter> Importer<'_, S> {
    fn reset(&mut self) -> Result<(), IngestError> {
        let deleted = self
            .store
            .delete_all_routes()
            .map_err(|source| IngestError::Reset {
                source: Box::new(source),
            })?;
        warn!("Deleted {deleted} existing routes.");
        self.report.deleted = Some(deleted);
        Ok(())
    }

    fn import_file(&mut self, file: &Utf8Path) -> Result<(), IngestError> {
        let text = read_source(file)?;
        let collection: RawCollection =
            serde_json::from_str(&text).map_err(|source| IngestError::Parse {
                path: file.to_path_buf(),
                source,
            })?;
        let features = collection.features.unwrap_or_default();
        if features.is_empty() {
            self.report
                .warn(format!("{}: no features found.", display_name(file)));
            return Ok(());
        }
        for (position, feature) in features.iter().enumerate() {
            self.import_feature(file, position + 1, feature)?;
        }
        Ok(())
    }

    fn import_feature(
        &mut self,
        file: &Utf8Path,
        index: usize,
        feature: &RawFeature,
    ) -> Result<(), IngestError> {
        let Some(geometry) = feature.geometry.as_ref() else {
            self.report.skipped += 1;
            return Ok(());
        };
        let malformed = |segment, reason| IngestError::MalformedCoordinates {
            file: file.to_path_buf(),
            feature: index,
            segment,
            reason,
        };
        let parts = match geometry.segments() {
            Err(fault) => return Err(malformed(fault.segment, fault.reason)),
            Ok(Segments::Empty) => {
                self.report.skipped += 1;
                return Ok(());
            }
            Ok(Segments::Unsupported(kind)) => {
                self.report.warn(format!(
                    "{} feature {index}: unsupported geometry {kind}, skipping.",
                    display_name(file)
                ));
                self.report.skipped += 1;
                return Ok(());
            }
            Ok(Segments::Lines { parts, dropped }) => {
                self.report.skipped += dropped;
                parts
            }
        };

        let base = naming::base_name(feature.properties.as_ref(), file, index);
        for (position, part) in parts.iter().enumerate() {
            let segment = position + 1;
            if part.len() < 2 {
                self.report.skipped += 1;
                continue;
            }
            let path = raw::polyline(part).map_err(|reason| malformed(segment, reason))?;
            let name = naming::segment_name(&base, segment, parts.len());
            self.upsert(&name, path)?;
        }
        Ok(())
    }

    fn upsert(&mut self, name: &str, path: Polyline) -> Result<(), IngestError> {
        let upsert = self
            .store
            .upsert_route(name, path)
            .map_err(|source| IngestError::Store {
                name: name.to_owned(),
                source: Box::new(source),
            })?;
        info!("{} route: {}", upsert.outcome.verb(), upsert.route.name);
        self.report.imported += 1;
        self.report.routes.push(upsert);
        Ok(())
    }
}

fn display_name(file: &Utf8Path) -> &str {
    file.file_name().unwrap_or(file.as_str())
}
