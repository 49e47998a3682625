//! Core domain types for tileprep.
//!
//! Responsibilities:
//! - Describe delimited exports with a validated [`Schema`].
//! - Parse rows into [`Record`]s keyed by [`RegionKey`].
//! - Render per-region tileset [`Recipe`] documents.
//!
//! Boundaries:
//! - No filesystem or thread handling (lives in `tileprep-data`).
//!
//! Invariants:
//! - Parsing is pure; the same line and schema always yield the same result.
#![forbid(unsafe_code)]

pub mod parser;
pub mod recipe;
mod record;
pub mod region;
pub mod schema;

pub use parser::{MalformedRow, RecordParser};
pub use recipe::{Recipe, RecipeError, RecipeTemplate};
pub use record::{AttributeValue, Record};
pub use region::{RegionKey, RegionKeyError};
pub use schema::{RowSchema, Schema, SchemaError};
