//! Convert command implementation for the tileprep CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use tileprep_core::{
    Schema,
    recipe::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM},
};
use tileprep_data::{
    CancellationToken, ConvertOptions, Converter, FileState, InputFile, RunSummary, convert,
    discover_inputs,
};
use tileprep_fs::open_utf8_file;

use crate::{
    ARG_CHUNK_SIZE, ARG_FLUSH_THRESHOLD, ARG_INPUT_DIR, ARG_MAX_ZOOM, ARG_MIN_ZOOM,
    ARG_OUTPUT_DIR, ARG_PATTERN, ARG_PROFILE, ARG_SCHEMA, ARG_WORKERS, CliError, ENV_INPUT_DIR,
    ENV_PROFILE,
};

const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_PATTERN: &str = "clu*_*_STR.txt";

/// CLI arguments for the `convert` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Convert every matching export in a directory into \
                 per-region GeoJSON files and tileset recipes. Options can \
                 come from CLI flags, configuration files, or environment \
                 variables.",
    about = "Convert exports into region folders"
)]
#[ortho_config(prefix = "TILEPREP")]
pub(crate) struct ConvertArgs {
    /// Directory holding the exports.
    #[arg(value_name = "dir")]
    #[serde(default)]
    pub(crate) input_dir: Option<Utf8PathBuf>,
    /// Directory that receives one folder per region (default: `output`).
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Number of files converted in parallel (default: 2).
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Lines read per chunk (default: 10000).
    #[arg(long = ARG_CHUNK_SIZE, value_name = "lines")]
    #[serde(default)]
    pub(crate) chunk_size: Option<usize>,
    /// Buffered records per region before a flush (default: 50000).
    #[arg(long = ARG_FLUSH_THRESHOLD, value_name = "records")]
    #[serde(default)]
    pub(crate) flush_threshold: Option<usize>,
    /// Glob selecting input file names (default: `clu*_*_STR.txt`).
    #[arg(long = ARG_PATTERN, value_name = "glob")]
    #[serde(default)]
    pub(crate) pattern: Option<String>,
    /// JSON column schema; the built-in CLU schema is used when omitted.
    #[arg(long = ARG_SCHEMA, value_name = "path")]
    #[serde(default)]
    pub(crate) schema: Option<Utf8PathBuf>,
    /// Account that owns the tileset sources named in recipes.
    #[arg(long = ARG_PROFILE, value_name = "name")]
    #[serde(default)]
    pub(crate) profile: Option<String>,
    /// Recipe minimum zoom (default: 1).
    #[arg(long = ARG_MIN_ZOOM, value_name = "zoom")]
    #[serde(default)]
    pub(crate) min_zoom: Option<u8>,
    /// Recipe maximum zoom (default: 13).
    #[arg(long = ARG_MAX_ZOOM, value_name = "zoom")]
    #[serde(default)]
    pub(crate) max_zoom: Option<u8>,
}

impl ConvertArgs {
    pub(crate) fn into_config(self) -> Result<ConvertConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvertConfig::try_from(merged)
    }
}

/// Resolved `convert` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertConfig {
    pub(crate) input_dir: Utf8PathBuf,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) workers: usize,
    pub(crate) chunk_size: usize,
    pub(crate) flush_threshold: usize,
    pub(crate) pattern: String,
    pub(crate) schema: Option<Utf8PathBuf>,
    pub(crate) profile: String,
    pub(crate) min_zoom: u8,
    pub(crate) max_zoom: u8,
}

impl ConvertConfig {
    fn load_schema(&self) -> Result<Schema, CliError> {
        let Some(path) = &self.schema else {
            return Ok(Schema::clu());
        };
        let file = open_utf8_file(path).map_err(|source| CliError::OpenSchema {
            path: path.clone(),
            source,
        })?;
        let schema = Schema::from_json_reader(BufReader::new(file)).map_err(|source| {
            CliError::InvalidSchema {
                path: path.clone(),
                source,
            }
        })?;
        schema.compile().map_err(|source| CliError::InvalidSchema {
            path: path.clone(),
            source,
        })?;
        Ok(schema)
    }

    fn options(&self, schema: Schema) -> ConvertOptions {
        ConvertOptions {
            workers: self.workers,
            chunk_size: self.chunk_size,
            flush_threshold: self.flush_threshold,
            schema,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            ..ConvertOptions::new(self.output_dir.clone(), self.profile.clone())
        }
    }
}

impl TryFrom<ConvertArgs> for ConvertConfig {
    type Error = CliError;

    fn try_from(args: ConvertArgs) -> Result<Self, Self::Error> {
        let input_dir = args.input_dir.ok_or(CliError::MissingArgument {
            field: ARG_INPUT_DIR,
            env: ENV_INPUT_DIR,
        })?;
        let profile = args
            .profile
            .filter(|profile| !profile.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_PROFILE,
                env: ENV_PROFILE,
            })?;

        Ok(Self {
            input_dir,
            output_dir: args
                .output_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
            workers: positive(args.workers, convert::DEFAULT_WORKERS, ARG_WORKERS)?,
            chunk_size: positive(args.chunk_size, convert::DEFAULT_CHUNK_SIZE, ARG_CHUNK_SIZE)?,
            flush_threshold: positive(
                args.flush_threshold,
                convert::DEFAULT_FLUSH_THRESHOLD,
                ARG_FLUSH_THRESHOLD,
            )?,
            pattern: args.pattern.unwrap_or_else(|| DEFAULT_PATTERN.to_owned()),
            schema: args.schema,
            profile,
            min_zoom: args.min_zoom.unwrap_or(DEFAULT_MIN_ZOOM),
            max_zoom: args.max_zoom.unwrap_or(DEFAULT_MAX_ZOOM),
        })
    }
}

fn positive(value: Option<usize>, default: usize, field: &'static str) -> Result<usize, CliError> {
    match value {
        Some(0) => Err(CliError::InvalidValue {
            field,
            reason: "must be at least 1",
        }),
        Some(value) => Ok(value),
        None => Ok(default),
    }
}

pub(super) fn run_convert(args: ConvertArgs) -> Result<(), CliError> {
    let config = args.into_config()?;
    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel)?;
    let mut stdout = std::io::stdout().lock();
    run_convert_with(&config, &cancel, &mut stdout).map(|_| ())
}

pub(super) fn run_convert_with(
    config: &ConvertConfig,
    cancel: &CancellationToken,
    writer: &mut dyn Write,
) -> Result<RunSummary, CliError> {
    let files = discover_inputs(&config.input_dir, &config.pattern)?;
    let schema = config.load_schema()?;
    let converter = Converter::new(config.options(schema))?;
    let done = AtomicUsize::new(0);
    let total = files.len();
    let progress = |file: &InputFile, state: FileState| {
        if state.is_terminal() {
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            info!("[{finished}/{total}] {}: {state:?}", file.file_name());
        }
    };
    let summary = converter.run_with_progress(&files, cancel, &progress);
    summary.write_report(writer).map_err(CliError::WriteReport)?;

    if cancel.is_cancelled() {
        return Err(CliError::Interrupted);
    }
    if summary.all_failed() {
        return Err(CliError::AllFilesFailed {
            count: summary.total_files(),
        });
    }
    info!(
        "wrote {} features across {} regions to {}",
        summary.features_written(),
        summary.regions().len(),
        config.output_dir
    );
    Ok(summary)
}

/// Cancel `token` on the first Ctrl+C.
fn install_interrupt_handler(token: &CancellationToken) -> Result<(), CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .map_err(CliError::InterruptHandler)?;
    let token = token.clone();
    std::thread::Builder::new()
        .name("tileprep-interrupt".to_owned())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received; finishing in-flight files");
                    token.cancel();
                }
            });
        })
        .map_err(CliError::InterruptHandler)?;
    Ok(())
}
