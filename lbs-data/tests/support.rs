//! Shared helpers for ingestion behaviour tests.

use std::{fs, path::PathBuf};

use camino::Utf8PathBuf;
use lbs_data::SourceLayout;
use tempfile::TempDir;

/// Directory holding the GeoJSON fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// A throwaway project root with a `data/` directory.
pub struct Project {
    _dir: TempDir,
    pub layout: SourceLayout,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let layout = SourceLayout::rooted_at(root);
        fs::create_dir_all(&layout.data_dir).expect("create data dir");
        Self { _dir: dir, layout }
    }

    /// Copy a named fixture into the data directory.
    pub fn stage(&self, fixture: &str) {
        let from = fixtures_dir().join(fixture);
        fs::copy(&from, self.layout.data_dir.join(fixture))
            .unwrap_or_else(|err| panic!("failed to stage fixture {from:?}: {err}"));
    }
}
