//! Locating and reading GeoJSON route sources.
//!
//! File access goes through `cap-std` directory handles opened with ambient
//! authority, keyed by UTF-8 `camino` paths.

use std::io::{self, Read};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

use crate::IngestError;

/// Prefix of route files picked up when no explicit paths are given.
pub const DEFAULT_SOURCE_PREFIX: &str = "routes_";
/// Extension of route files picked up when no explicit paths are given.
pub const DEFAULT_SOURCE_EXTENSION: &str = "geojson";

/// Directories used to resolve relative source paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLayout {
    /// Project root; relative paths are tried here first.
    pub base_dir: Utf8PathBuf,
    /// Bundled data directory; fallback for relative paths and home of the
    /// default `routes_*.geojson` files.
    pub data_dir: Utf8PathBuf,
}

impl SourceLayout {
    /// Layout rooted at `base_dir` with data under `base_dir/data`.
    pub fn rooted_at(base_dir: impl Into<Utf8PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let data_dir = base_dir.join("data");
        Self { base_dir, data_dir }
    }

    /// Resolve the files an import run should read.
    ///
    /// Explicit paths are used as given when absolute, otherwise tried under
    /// the base directory and then the data directory. Without explicit paths
    /// every `routes_*.geojson` file in the data directory is used, sorted by
    /// name.
    ///
    /// # Errors
    /// [`IngestError::SourceNotFound`] when an explicit path resolves nowhere,
    /// [`IngestError::NoSources`] when the resulting list is empty, and
    /// [`IngestError::ListSources`] when the data directory cannot be read.
    pub fn resolve<S: AsRef<str>>(&self, raw_paths: &[S]) -> Result<Vec<Utf8PathBuf>, IngestError> {
        let files = if raw_paths.is_empty() {
            self.default_sources()?
        } else {
            raw_paths
                .iter()
                .map(|raw| self.resolve_one(raw.as_ref()))
                .collect::<Result<Vec<_>, _>>()?
        };
        if files.is_empty() {
            return Err(IngestError::NoSources);
        }
        Ok(files)
    }

    fn resolve_one(&self, raw: &str) -> Result<Utf8PathBuf, IngestError> {
        let given = Utf8Path::new(raw);
        let candidates = if given.is_absolute() {
            vec![given.to_path_buf()]
        } else {
            vec![self.base_dir.join(given), self.data_dir.join(given)]
        };
        candidates
            .into_iter()
            .find(|candidate| is_file(candidate))
            .ok_or_else(|| IngestError::SourceNotFound {
                path: raw.to_owned(),
            })
    }

    fn default_sources(&self) -> Result<Vec<Utf8PathBuf>, IngestError> {
        let dir = match fs_utf8::Dir::open_ambient_dir(&self.data_dir, ambient_authority()) {
            Ok(dir) => dir,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(IngestError::ListSources {
                    path: self.data_dir.clone(),
                    source,
                });
            }
        };
        let list_error = |source| IngestError::ListSources {
            path: self.data_dir.clone(),
            source,
        };
        let mut names = Vec::new();
        for entry in dir.entries().map_err(list_error)? {
            let entry = entry.map_err(list_error)?;
            if !entry.file_type().map_err(list_error)?.is_file() {
                continue;
            }
            let name = entry.file_name().map_err(list_error)?;
            if is_default_source(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| self.data_dir.join(name))
            .collect())
    }
}

fn is_default_source(name: &str) -> bool {
    let file = Utf8Path::new(name);
    name.starts_with(DEFAULT_SOURCE_PREFIX) && file.extension() == Some(DEFAULT_SOURCE_EXTENSION)
}

/// Read a whole source file as UTF-8 text.
///
/// # Errors
/// [`IngestError::Read`] citing the path when the file cannot be opened or
/// is not valid UTF-8.
pub fn read_source(path: &Utf8Path) -> Result<String, IngestError> {
    read_utf8_file(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a UTF-8 text file through a capability handle on its parent
/// directory.
///
/// # Errors
/// Any I/O failure, including invalid UTF-8 content.
pub fn read_utf8_file(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = open_dir_and_file(path)?;
    let mut file = dir.open(name.as_str())?;
    let mut text = String::new();
    file.read_to_string(&mut text)?;
    Ok(text)
}

/// Whether `path` names an existing regular file.
#[must_use]
pub fn is_file(path: &Utf8Path) -> bool {
    open_dir_and_file(path)
        .and_then(|(dir, name)| dir.metadata(name.as_str()))
        .is_ok_and(|meta| meta.is_file())
}

fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other("source path should include a file name"))?
        .to_owned();
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name))
}
