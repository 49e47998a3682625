//! Error types shared across the conversion pipeline.

use camino::Utf8PathBuf;
use std::io;
use thiserror::Error;
use tileprep_core::{RecipeError, SchemaError};

use crate::input::ChunkReadError;

/// Failures that abort a single input file.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to open input file at {path}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read input file at {path} near line {line}")]
    Read {
        path: Utf8PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("first row has {found} fields but the schema expects {expected}")]
    SchemaMismatch { expected: usize, found: usize },
    #[error("no region is known for state {state:?} in file name {file_name:?}")]
    FileRegion {
        file_name: String,
        state: Option<String>,
    },
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("cancelled")]
    Cancelled,
    #[error("worker panicked: {message}")]
    Panicked { message: String },
}

impl From<ChunkReadError> for FileError {
    fn from(err: ChunkReadError) -> Self {
        match err {
            ChunkReadError::Open { path, source } => Self::Open { path, source },
            ChunkReadError::Read { path, line, source } => Self::Read { path, line, source },
        }
    }
}

/// Failures while writing region output.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create output directory {path}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create output file {path}")]
    Create {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output file {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialise output for region {region}")]
    Serialise {
        region: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures while locating input files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("input directory {path} does not exist")]
    MissingDirectory { path: Utf8PathBuf },
    #[error("failed to list input directory {path}")]
    List {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid file pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("no files in {path} match {pattern:?}")]
    NoMatches { path: Utf8PathBuf, pattern: String },
}

/// Invalid conversion settings.
#[derive(Debug, Error)]
pub enum ConvertOptionsError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,
    #[error("flush threshold must be at least 1")]
    ZeroFlushThreshold,
    #[error("invalid schema")]
    Schema(#[from] SchemaError),
    #[error("invalid recipe settings")]
    Recipe(#[from] RecipeError),
    #[error("failed to start worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
