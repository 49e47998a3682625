//! Error types emitted by the tileprep CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tileprep_core::SchemaError;
use tileprep_data::{ConvertOptionsError, DiscoveryError, ScanError};

/// Errors emitted by the tileprep CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option holds a value the converter cannot use.
    #[error("invalid --{field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    /// Input discovery failed or found nothing to convert.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Opening the schema file failed.
    #[error("failed to open schema at {path:?}: {source}")]
    OpenSchema {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The schema file could not be parsed or validated.
    #[error("invalid schema at {path:?}: {source}")]
    InvalidSchema {
        path: Utf8PathBuf,
        #[source]
        source: SchemaError,
    },
    /// Conversion settings were rejected.
    #[error("invalid conversion settings: {0}")]
    ConvertOptions(#[from] ConvertOptionsError),
    /// The Ctrl+C listener could not be started.
    #[error("failed to install interrupt handler: {0}")]
    InterruptHandler(#[source] std::io::Error),
    /// Every input file failed.
    #[error("all {count} input files failed")]
    AllFilesFailed { count: usize },
    /// The run was interrupted before every file finished.
    #[error("conversion interrupted")]
    Interrupted,
    /// Scanning the output directory failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
    /// No region folder is ready for upload.
    #[error("no region folder in {path:?} is ready for upload")]
    NoReadyFolders { path: Utf8PathBuf },
    /// Writing the report failed.
    #[error("failed to write report: {0}")]
    WriteReport(#[source] std::io::Error),
}
