//! Facade crate for tileprep.
//!
//! This crate re-exports the schema, parsing and conversion types needed to
//! embed the converter without depending on each workspace crate directly.

#![forbid(unsafe_code)]

pub use tileprep_core::{
    AttributeValue, MalformedRow, Recipe, RecipeError, RecipeTemplate, Record, RecordParser,
    RegionKey, RegionKeyError, RowSchema, Schema, SchemaError,
};

pub use tileprep_data::{
    CancellationToken, ConvertOptions, ConvertOptionsError, Converter, DiscoveryError, FileError,
    FileOutcome, FileState, FileStats, InputFile, Progress, RunSummary, WorkerResult, WriteError,
    discover_inputs,
};
