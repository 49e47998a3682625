//! Tests for the check command.

use super::*;
use crate::check::run_check_with;
use camino::Utf8PathBuf;
use rstest::rstest;
use std::fs;
use tempfile::TempDir;

fn output_dir(folders: &[(&str, &[&str])]) -> (TempDir, Utf8PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
    for (folder, files) in folders {
        fs::create_dir(root.join(folder)).expect("create folder");
        for file in *files {
            fs::write(root.join(folder).join(file), "{}").expect("write file");
        }
    }
    (dir, root)
}

#[rstest]
fn reports_ready_and_incomplete_folders() {
    let (_guard, root) = output_dir(&[
        ("01", &["01.geojson", "recipe.json"]),
        ("02", &["recipe.json"]),
    ]);
    let mut report = Vec::new();

    let folders = run_check_with(root, &mut report).expect("one folder is ready");

    assert_eq!(folders.len(), 2);
    let report = String::from_utf8(report).expect("utf-8 report");
    assert!(report.contains("ready      01 (01.geojson)"), "report: {report}");
    assert!(report.contains("incomplete 02 (missing GeoJSON)"), "report: {report}");
    assert!(report.contains("1 of 2 folders ready"), "report: {report}");
}

#[rstest]
fn fails_when_nothing_is_ready() {
    let (_guard, root) = output_dir(&[("03", &["03.geojson"])]);
    let err = run_check_with(root.clone(), &mut Vec::new()).expect_err("nothing ready");
    match err {
        CliError::NoReadyFolders { path } => assert_eq!(path, root),
        other => panic!("expected NoReadyFolders, found {other:?}"),
    }
}
