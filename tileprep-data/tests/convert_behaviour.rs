//! Behavioural tests for directory conversion.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, path::PathBuf};
use tileprep_data::{
    CancellationToken, ConvertOptions, Converter, RunSummary, discover_inputs,
    output::RECIPE_FILE_NAME,
};

mod support;

use support::{Workspace, point_schema, read_collection};

const PREVIOUS_RECIPE: &str = "{\"version\": 0}\n";

#[fixture]
fn workspace() -> Workspace {
    Workspace::new()
}

#[fixture]
fn run_summary() -> RefCell<Option<RunSummary>> {
    RefCell::new(None)
}

fn expect_summary<T>(
    summary: &RefCell<Option<RunSummary>>,
    check: impl FnOnce(&RunSummary) -> T,
) -> T {
    let borrowed = summary.borrow();
    check(borrowed.as_ref().expect("conversion was run"))
}

#[given(
    "an export \"clu01_x_STR.txt\" with two valid rows for region \"01\" and one row without a region"
)]
fn valid_export(#[from(workspace)] workspace: &Workspace) {
    workspace.write_input("clu01_x_STR.txt", "01|-86.8|33.5|7\n1|-86.7|33.6|8\n|-86.6|33.7|9\n");
}

#[given("an export \"clu02_y_STR.txt\" with the wrong number of columns")]
fn malformed_export(#[from(workspace)] workspace: &Workspace) {
    workspace.write_input("clu02_y_STR.txt", "02|-86.8|33.5\n");
}

#[given("a previous recipe for region \"01\"")]
fn previous_recipe(#[from(workspace)] workspace: &Workspace) {
    let dir = workspace.output.join("01");
    fs::create_dir_all(&dir).expect("create region folder");
    fs::write(dir.join(RECIPE_FILE_NAME), PREVIOUS_RECIPE).expect("write previous recipe");
}

#[when("the directory is converted")]
fn convert_directory(
    #[from(workspace)] workspace: &Workspace,
    #[from(run_summary)] summary: &RefCell<Option<RunSummary>>,
) {
    let files = discover_inputs(&workspace.input, "clu*_*_STR.txt").expect("inputs exist");
    let mut options = ConvertOptions::new(workspace.output.clone(), "acme");
    options.schema = point_schema();
    let converter = Converter::new(options).expect("valid options");
    *summary.borrow_mut() = Some(converter.run(&files, &CancellationToken::new()));
}

#[then("the summary reports 1 succeeded file, 2 accepted rows and 1 rejected row")]
fn single_file_counts(#[from(run_summary)] summary: &RefCell<Option<RunSummary>>) {
    expect_summary(summary, |summary| {
        assert_eq!(summary.total_files(), 1);
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.rows_accepted(), 2);
        assert_eq!(summary.rows_rejected(), 1);
    });
}

#[then("the summary reports 1 succeeded file and 1 failed file")]
fn mixed_counts(#[from(run_summary)] summary: &RefCell<Option<RunSummary>>) {
    expect_summary(summary, |summary| {
        assert_eq!(summary.succeeded(), 1);
        assert_eq!(summary.failed(), 1);
        assert!(!summary.all_failed());
    });
}

#[then("region \"01\" holds 2 features and a recipe")]
fn region_contents(#[from(workspace)] workspace: &Workspace) {
    let collection = read_collection(&workspace.output.join("01/01.geojson"));
    assert_eq!(collection.features.len(), 2);
    let recipe: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(workspace.output.join("01").join(RECIPE_FILE_NAME))
            .expect("recipe exists"),
    )
    .expect("recipe is JSON");
    assert_eq!(
        recipe["layers"]["01"]["source"],
        "mapbox://tileset-source/acme/01"
    );
    assert_eq!(
        recipe["layers"]["01"]["features"]["attributes"]["allowed_output"],
        serde_json::json!(["farmNumber"])
    );
}

#[then("the recipe for region \"01\" is unchanged")]
fn recipe_unchanged(#[from(workspace)] workspace: &Workspace) {
    let contents = fs::read_to_string(workspace.output.join("01").join(RECIPE_FILE_NAME))
        .expect("recipe exists");
    assert_eq!(contents, PREVIOUS_RECIPE);
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features/convert_directory.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        vec![
            "converting a single export with one bad row",
            "rerunning keeps the existing recipe",
            "a malformed export does not stop the others",
        ]
    );
}

#[scenario(path = "tests/features/convert_directory.feature", index = 0)]
fn converting_single_export(workspace: Workspace, run_summary: RefCell<Option<RunSummary>>) {
    let _ = (workspace, run_summary);
}

#[scenario(path = "tests/features/convert_directory.feature", index = 1)]
fn rerunning_keeps_recipe(workspace: Workspace, run_summary: RefCell<Option<RunSummary>>) {
    let _ = (workspace, run_summary);
}

#[scenario(path = "tests/features/convert_directory.feature", index = 2)]
fn malformed_export_is_isolated(workspace: Workspace, run_summary: RefCell<Option<RunSummary>>) {
    let _ = (workspace, run_summary);
}
