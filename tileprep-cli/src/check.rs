//! Check command implementation for the tileprep CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tileprep_data::{FolderStatus, scan_output_folders};

use crate::{ARG_OUTPUT_DIR, CliError, ENV_CHECK_OUTPUT_DIR};

/// CLI arguments for the `check` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Scan an output directory the way the uploader does and \
                 list which region folders hold both a recipe and GeoJSON.",
    about = "Report region folders ready for upload"
)]
#[ortho_config(prefix = "TILEPREP")]
pub(crate) struct CheckArgs {
    /// Output directory written by `convert`.
    #[arg(value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
}

pub(super) fn run_check(args: CheckArgs) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let output_dir = merged.output_dir.ok_or(CliError::MissingArgument {
        field: ARG_OUTPUT_DIR,
        env: ENV_CHECK_OUTPUT_DIR,
    })?;
    let mut stdout = std::io::stdout().lock();
    run_check_with(output_dir, &mut stdout).map(|_| ())
}

pub(super) fn run_check_with(
    output_dir: Utf8PathBuf,
    writer: &mut dyn Write,
) -> Result<Vec<FolderStatus>, CliError> {
    let folders = scan_output_folders(&output_dir)?;
    write_check_report(writer, &folders).map_err(CliError::WriteReport)?;
    if folders.iter().any(FolderStatus::is_ready) {
        Ok(folders)
    } else {
        Err(CliError::NoReadyFolders { path: output_dir })
    }
}

fn write_check_report(writer: &mut dyn Write, folders: &[FolderStatus]) -> std::io::Result<()> {
    for folder in folders {
        if folder.is_ready() {
            writeln!(
                writer,
                "ready      {} ({})",
                folder.name,
                folder.geojson_files.join(", ")
            )?;
        } else {
            let missing = if folder.has_recipe { "GeoJSON" } else { "recipe" };
            writeln!(writer, "incomplete {} (missing {missing})", folder.name)?;
        }
    }
    let ready = folders.iter().filter(|folder| folder.is_ready()).count();
    writeln!(writer, "{ready} of {} folders ready", folders.len())
}
