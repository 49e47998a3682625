#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;
use tileprep_core::Schema;

/// Scratch input and output directories for one test.
pub struct Workspace {
    _dir: TempDir,
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("failed to create temp dir: {err}"));
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp dir {path:?} is not UTF-8"));
        let input = root.join("input");
        fs::create_dir(&input).unwrap_or_else(|err| panic!("failed to create {input}: {err}"));
        Self {
            _dir: dir,
            input,
            output: root.join("output"),
        }
    }

    pub fn write_input(&self, name: &str, contents: &str) {
        let path = self.input.join(name);
        fs::write(&path, contents).unwrap_or_else(|err| panic!("failed to write {path}: {err}"));
    }
}

/// Point schema keyed by a `state` column.
pub fn point_schema() -> Schema {
    serde_json::from_str(
        r#"{
            "columns": ["state", "lon", "lat", "farm"],
            "geometry": {"kind": "point", "x": "lon", "y": "lat"},
            "region": {"kind": "column", "column": "state"},
            "attributes": [
                {"name": "farmNumber", "source": {"kind": "column", "column": "farm", "value": "integer"}}
            ]
        }"#,
    )
    .unwrap_or_else(|err| panic!("point schema should parse: {err}"))
}

/// Parse a region file with the `geojson` crate.
pub fn read_collection(path: &Utf8Path) -> geojson::FeatureCollection {
    let text = fs::read_to_string(path).unwrap_or_else(|err| panic!("failed to read {path}: {err}"));
    let parsed: geojson::GeoJson = text
        .parse()
        .unwrap_or_else(|err| panic!("{path} is not valid GeoJSON: {err}"));
    geojson::FeatureCollection::try_from(parsed)
        .unwrap_or_else(|err| panic!("{path} is not a FeatureCollection: {err}"))
}
