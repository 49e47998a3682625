//! Command-line interface for converting delimited exports into tileset
//! sources.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod check;
mod convert;
mod error;

pub use error::CliError;

use check::CheckArgs;
use convert::ConvertArgs;

pub(crate) const ARG_INPUT_DIR: &str = "input-dir";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_WORKERS: &str = "workers";
pub(crate) const ARG_CHUNK_SIZE: &str = "chunk-size";
pub(crate) const ARG_FLUSH_THRESHOLD: &str = "flush-threshold";
pub(crate) const ARG_PATTERN: &str = "pattern";
pub(crate) const ARG_SCHEMA: &str = "schema";
pub(crate) const ARG_PROFILE: &str = "profile";
pub(crate) const ARG_MIN_ZOOM: &str = "min-zoom";
pub(crate) const ARG_MAX_ZOOM: &str = "max-zoom";
pub(crate) const ENV_INPUT_DIR: &str = "TILEPREP_CMDS_CONVERT_INPUT_DIR";
pub(crate) const ENV_PROFILE: &str = "TILEPREP_CMDS_CONVERT_PROFILE";
pub(crate) const ENV_CHECK_OUTPUT_DIR: &str = "TILEPREP_CMDS_CHECK_OUTPUT_DIR";

/// Run the tileprep CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Convert(args) => convert::run_convert(args),
        Command::Check(args) => check::run_check(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tileprep",
    about = "Convert delimited geospatial exports into per-region GeoJSON tileset sources",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a directory of exports into region folders.
    Convert(ConvertArgs),
    /// Report which region folders are ready for upload.
    Check(CheckArgs),
}

#[cfg(test)]
mod tests;
