//! Temporary project directories and output parsing for CLI tests.

use super::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

/// Corners of the area seeded by [`Sandbox::seed_city_centre`].
pub(super) const CITY_CENTRE: [(f64, f64); 4] =
    [(-6.28, 53.33), (-6.20, 53.33), (-6.20, 53.37), (-6.28, 53.37)];

/// Name, category, latitude and longitude of the seeded amenities.
pub(super) const AMENITIES: [(&str, &str, f64, f64); 3] = [
    ("Brew Lab", "cafe", 53.35, -6.26),
    ("Lift Hub", "gym", 53.34, -6.25),
    ("Far Cafe", "cafe", 53.38, -6.24),
];

/// A throwaway project root holding a database and a `data/` directory.
pub(super) struct Sandbox {
    _dir: TempDir,
    pub(super) root: Utf8PathBuf,
    pub(super) database: Utf8PathBuf,
}

impl Sandbox {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        fs::create_dir_all(root.join("data")).expect("create data dir");
        let database = root.join("lbs.db");
        Self {
            _dir: dir,
            root,
            database,
        }
    }

    /// Run `lbs <args> --database <db>` and capture stdout.
    pub(super) fn run(&self, args: &[&str]) -> (Result<(), CliError>, String) {
        let mut invocation = vec!["lbs".to_owned()];
        invocation.extend(args.iter().map(|arg| (*arg).to_owned()));
        invocation.extend([format!("--{ARG_DATABASE}"), self.database.to_string()]);
        let mut output = Vec::new();
        let result = run_with(invocation, &mut output);
        (result, String::from_utf8(output).expect("utf-8 output"))
    }

    /// Write a GeoJSON polygon feature under the project root.
    pub(super) fn write_boundary(&self, file: &str, corners: &[(f64, f64)]) -> Utf8PathBuf {
        let ring: Vec<[f64; 2]> = corners.iter().map(|&(lon, lat)| [lon, lat]).collect();
        let feature = json!({
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Polygon", "coordinates": [ring] },
        });
        self.write(file, &feature)
    }

    /// Write a single-route GeoJSON file into `data/`.
    pub(super) fn write_route(&self, file: &str, name: &str, points: &[(f64, f64)]) {
        let line: Vec<[f64; 2]> = points.iter().map(|&(lon, lat)| [lon, lat]).collect();
        let collection = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": { "name": name },
                "geometry": { "type": "LineString", "coordinates": line },
            }],
        });
        self.write(&format!("data/{file}"), &collection);
    }

    fn write(&self, file: &str, value: &Value) -> Utf8PathBuf {
        let path = self.root.join(file);
        fs::write(&path, value.to_string()).expect("write fixture");
        path
    }

    /// Seed the city-centre area and three amenities, returning the area id.
    pub(super) fn seed_city_centre(&self) -> String {
        let boundary = self.write_boundary("city_centre.geojson", &CITY_CENTRE);
        let (result, output) = self.run(&[
            "add-area",
            "--name",
            "City Centre",
            "--boundary",
            boundary.as_str(),
        ]);
        result.expect("add-area should succeed");
        let area: Value = serde_json::from_str(&output).expect("area feature JSON");
        let id = area["id"].as_u64().expect("numeric area id");
        for (name, category, lat, lng) in AMENITIES {
            let (result, _) = self.run(&[
                "add-amenity",
                "--name",
                name,
                "--category",
                category,
                "--lat",
                &lat.to_string(),
                "--lng",
                &lng.to_string(),
            ]);
            result.expect("add-amenity should succeed");
        }
        id.to_string()
    }
}

/// Names of the features in a printed feature collection, in order.
pub(super) fn feature_names(output: &str) -> Vec<String> {
    let collection: Value = serde_json::from_str(output).expect("feature collection JSON");
    collection["features"]
        .as_array()
        .expect("features array")
        .iter()
        .map(|feature| {
            feature["properties"]["name"]
                .as_str()
                .expect("feature name")
                .to_owned()
        })
        .collect()
}
