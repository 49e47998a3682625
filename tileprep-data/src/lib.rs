//! File handling and conversion pipeline for tileprep.
//!
//! Responsibilities:
//! - Discover input exports and stream them in bounded chunks.
//! - Group parsed records by region and append them to GeoJSON files.
//! - Write one tileset recipe per region.
//! - Run whole files across a bounded worker pool.
//!
//! Boundaries:
//! - Row semantics live in `tileprep-core`.
//! - No command-line handling (lives in `tileprep-cli`).
//!
//! Invariants:
//! - Failures are isolated to the input file that caused them.
//! - Every region file opened during a run is closed as valid JSON.
#![forbid(unsafe_code)]

pub mod convert;
mod error;
pub mod input;
pub mod output;

pub use convert::{
    CancellationToken, ConvertOptions, Converter, FileOutcome, FileState, FileStats, Progress,
    RunSummary, WorkerResult,
};
pub use error::{ConvertOptionsError, DiscoveryError, FileError, WriteError};
pub use input::{InputFile, discover_inputs};
pub use output::{FolderStatus, ScanError, scan_output_folders};
