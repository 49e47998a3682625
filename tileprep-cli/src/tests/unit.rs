//! Focused unit tests covering convert configuration resolution.

use super::*;
use crate::convert::{ConvertArgs, ConvertConfig};
use camino::Utf8PathBuf;
use rstest::rstest;

fn args() -> ConvertArgs {
    ConvertArgs {
        input_dir: Some(Utf8PathBuf::from("exports")),
        profile: Some("acme".to_owned()),
        ..ConvertArgs::default()
    }
}

#[rstest]
fn applies_defaults() {
    let config = ConvertConfig::try_from(args()).expect("valid arguments");
    assert_eq!(config.output_dir, Utf8PathBuf::from("output"));
    assert_eq!(config.workers, 2);
    assert_eq!(config.chunk_size, 10_000);
    assert_eq!(config.flush_threshold, 50_000);
    assert_eq!(config.pattern, "clu*_*_STR.txt");
    assert_eq!((config.min_zoom, config.max_zoom), (1, 13));
    assert_eq!(config.schema, None);
}

#[rstest]
#[case(ConvertArgs { input_dir: None, ..args() }, ARG_INPUT_DIR, ENV_INPUT_DIR)]
#[case(ConvertArgs { profile: None, ..args() }, ARG_PROFILE, ENV_PROFILE)]
#[case(ConvertArgs { profile: Some("  ".into()), ..args() }, ARG_PROFILE, ENV_PROFILE)]
fn converting_without_required_fields_errors(
    #[case] args: ConvertArgs,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let err = ConvertConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
#[case(ConvertArgs { workers: Some(0), ..args() }, ARG_WORKERS)]
#[case(ConvertArgs { chunk_size: Some(0), ..args() }, ARG_CHUNK_SIZE)]
#[case(ConvertArgs { flush_threshold: Some(0), ..args() }, ARG_FLUSH_THRESHOLD)]
fn zero_sizes_are_rejected(#[case] args: ConvertArgs, #[case] expected: &'static str) {
    match ConvertConfig::try_from(args) {
        Err(CliError::InvalidValue { field, .. }) => assert_eq!(field, expected),
        other => panic!("expected InvalidValue, found {other:?}"),
    }
}

#[rstest]
fn parses_convert_flags() {
    let cli = Cli::try_parse_from([
        "tileprep",
        "convert",
        "exports",
        "--output-dir",
        "tiles",
        "--workers",
        "4",
        "--profile",
        "acme",
        "--max-zoom",
        "12",
    ])
    .expect("arguments parse");
    let Command::Convert(args) = cli.command else {
        panic!("expected convert command");
    };
    assert_eq!(args.input_dir, Some(Utf8PathBuf::from("exports")));
    assert_eq!(args.output_dir, Some(Utf8PathBuf::from("tiles")));
    assert_eq!(args.workers, Some(4));
    assert_eq!(args.max_zoom, Some(12));
}

#[rstest]
fn rejects_non_numeric_workers() {
    let err = Cli::try_parse_from(["tileprep", "convert", "in", "--workers", "many"])
        .expect_err("workers must be numeric");
    assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
}
