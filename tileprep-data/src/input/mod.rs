//! Input discovery and chunked reading.

mod chunk;
mod discovery;

pub use chunk::{Chunk, ChunkReadError, ChunkReader};
pub use discovery::{InputFile, discover_inputs};
